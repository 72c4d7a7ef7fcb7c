//! Structural scanning of Python source text.
//!
//! Recovers classes, functions and methods from raw text using indentation
//! and token heuristics. Nothing is imported or executed, and this is not a
//! grammar: unusual formatting yields fewer declarations or a flagged
//! signature, never a failure.

mod docstring;
mod exports;
mod lines;
mod signature;

use std::fmt;
use std::iter::Peekable;

use log::debug;
use smallvec::SmallVec;

pub use docstring::{clean_docstring, extract_docstring, DocstringScan};
pub use exports::AllowList;
pub use lines::{measure_indent, LogicalLine, LogicalLines, DEFAULT_TAB_WIDTH};
pub use signature::{parse_signature, split_parameters, Keyword, Signature, SignatureError};

use exports::parse_export_assignment;

/// What a declaration is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Module,
    Class,
    Method,
    Function,
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclarationKind::Module => write!(f, "module"),
            DeclarationKind::Class => write!(f, "class"),
            DeclarationKind::Method => write!(f, "method"),
            DeclarationKind::Function => write!(f, "function"),
        }
    }
}

/// How a parameter binds its argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    Positional,
    /// `name=default`
    Keyword,
    /// `*args`
    VariadicPositional,
    /// `**kwargs`
    VariadicKeyword,
    /// Bare `*`
    KeywordOnlyMarker,
    /// Bare `/`
    PositionalOnlyMarker,
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterKind::Positional => write!(f, "positional"),
            ParameterKind::Keyword => write!(f, "keyword"),
            ParameterKind::VariadicPositional => write!(f, "var_positional"),
            ParameterKind::VariadicKeyword => write!(f, "var_keyword"),
            ParameterKind::KeywordOnlyMarker => write!(f, "keyword_only_marker"),
            ParameterKind::PositionalOnlyMarker => write!(f, "positional_only_marker"),
        }
    }
}

/// A parameter of a function, or a base of a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Name without `*`/`**`. Empty for bare markers.
    pub name: String,
    pub annotation: Option<String>,
    pub default: Option<String>,
    pub kind: ParameterKind,
}

impl Parameter {
    pub fn positional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: None,
            default: None,
            kind: ParameterKind::Positional,
        }
    }

    pub(crate) fn marker(kind: ParameterKind) -> Self {
        Self {
            name: String::new(),
            annotation: None,
            default: None,
            kind,
        }
    }

    pub fn is_variadic(&self) -> bool {
        matches!(
            self.kind,
            ParameterKind::VariadicPositional | ParameterKind::VariadicKeyword
        )
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ParameterKind::KeywordOnlyMarker => return write!(f, "*"),
            ParameterKind::PositionalOnlyMarker => return write!(f, "/"),
            ParameterKind::VariadicPositional => write!(f, "*")?,
            ParameterKind::VariadicKeyword => write!(f, "**")?,
            _ => {}
        }
        write!(f, "{}", self.name)?;
        match (&self.annotation, &self.default) {
            (Some(annotation), Some(default)) => write!(f, ": {} = {}", annotation, default),
            (Some(annotation), None) => write!(f, ": {}", annotation),
            (None, Some(default)) => write!(f, "={}", default),
            (None, None) => Ok(()),
        }
    }
}

/// The constructor name, kept even though it starts with `_`.
pub const CONSTRUCTOR: &str = "__init__";

/// A discovered module, class, function or method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub kind: DeclarationKind,
    pub name: String,
    pub parameters: SmallVec<[Parameter; 4]>,
    /// False when the header's brackets never balanced.
    pub signature_parsed: bool,
    pub docstring: Option<String>,
    /// Indentation column of the header.
    pub indent_level: usize,
    /// 1-indexed header line (0 for modules).
    pub line: usize,
    pub is_async: bool,
    /// Decorators directly above the header, without `@` or arguments.
    pub decorators: SmallVec<[String; 2]>,
    /// Source-order index of the enclosing declaration.
    pub parent: Option<usize>,
}

impl Declaration {
    /// The root declaration standing for a whole module.
    pub fn module(name: impl Into<String>, docstring: Option<String>) -> Self {
        Self {
            kind: DeclarationKind::Module,
            name: name.into(),
            parameters: SmallVec::new(),
            signature_parsed: true,
            docstring,
            indent_level: 0,
            line: 0,
            is_async: false,
            decorators: SmallVec::new(),
            parent: None,
        }
    }

    /// Has a non-blank docstring.
    pub fn is_documented(&self) -> bool {
        self.docstring
            .as_deref()
            .is_some_and(|doc| !doc.trim().is_empty())
    }

    pub fn is_constructor(&self) -> bool {
        self.kind == DeclarationKind::Method && self.name == CONSTRUCTOR
    }

    /// Leading underscore naming convention.
    pub fn is_private(&self) -> bool {
        self.name.starts_with('_') && !self.is_constructor()
    }
}

/// Why part of the input was skipped or degraded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GapReason {
    /// Started like a declaration but could not be tokenized.
    Unclassified(SignatureError),
    /// Parameter list never closed; declaration kept without parameters.
    UnbalancedSignature,
    /// Docstring delimiter never closed; treated as no docstring.
    UnterminatedDocstring,
}

impl fmt::Display for GapReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GapReason::Unclassified(e) => write!(f, "unclassified declaration: {}", e),
            GapReason::UnbalancedSignature => write!(f, "unbalanced signature"),
            GapReason::UnterminatedDocstring => write!(f, "unterminated docstring"),
        }
    }
}

/// A non-fatal parse gap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseGap {
    /// 1-indexed line.
    pub line: usize,
    pub reason: GapReason,
}

/// Options for structural scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Columns a tab advances to when measuring indentation.
    pub tab_width: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            tab_width: DEFAULT_TAB_WIDTH,
        }
    }
}

/// The text of one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    file_name: String,
    text: String,
}

impl SourceUnit {
    pub fn new(file_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            text: text.into(),
        }
    }

    /// File name as given, e.g. `utils.py`.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// File name without its `.py`/`.pyi` suffix.
    pub fn module_name(&self) -> &str {
        self.file_name
            .strip_suffix(".py")
            .or_else(|| self.file_name.strip_suffix(".pyi"))
            .unwrap_or(&self.file_name)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }

    /// Start a single-pass scan over this unit.
    pub fn scan(&self, options: &ScanOptions) -> Scanner<'_> {
        Scanner::new(&self.text, options)
    }
}

/// Module-level facts known once a scan is exhausted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub module_docstring: Option<String>,
    pub exports: Option<AllowList>,
    pub gaps: Vec<ParseGap>,
}

struct OpenScope {
    indent: usize,
    index: usize,
    kind: DeclarationKind,
}

/// Lazy, source-order iterator over the declarations of a source text.
///
/// Module docstring, `__all__` and parse gaps are collected on the side and
/// available from [`Scanner::finish`].
pub struct Scanner<'a> {
    lines: Peekable<LogicalLines<'a>>,
    scopes: Vec<OpenScope>,
    decorators: SmallVec<[String; 2]>,
    emitted: usize,
    started: bool,
    summary: ScanSummary,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str, options: &ScanOptions) -> Self {
        Self {
            lines: LogicalLines::new(text, options.tab_width).peekable(),
            scopes: Vec::new(),
            decorators: SmallVec::new(),
            emitted: 0,
            started: false,
            summary: ScanSummary::default(),
        }
    }

    /// Module-level facts gathered so far.
    pub fn finish(self) -> ScanSummary {
        self.summary
    }

    fn gap(&mut self, line: usize, reason: GapReason) {
        debug!("line {}: {}", line, reason);
        self.summary.gaps.push(ParseGap { line, reason });
    }

    /// Docstring of the declaration whose header is `header`.
    fn body_docstring(&mut self, header: &LogicalLine, inline_body: Option<&str>) -> Option<String> {
        let scan = match inline_body {
            Some(body) => extract_docstring(body),
            None => {
                let first = self.lines.peek().filter(|next| next.indent > header.indent)?;
                let scan = extract_docstring(&first.text);
                if scan != DocstringScan::Absent {
                    self.lines.next();
                }
                scan
            }
        };

        match scan {
            DocstringScan::Found(doc) => Some(doc),
            DocstringScan::Absent => None,
            DocstringScan::Unterminated => {
                self.gap(header.line, GapReason::UnterminatedDocstring);
                None
            }
        }
    }

    fn declare(&mut self, line: &LogicalLine, signature: Signature) -> Declaration {
        let parent = self.scopes.last();
        let kind = match (signature.keyword, parent.map(|s| s.kind)) {
            (Keyword::Class, _) => DeclarationKind::Class,
            (Keyword::Def, Some(DeclarationKind::Class)) => DeclarationKind::Method,
            (Keyword::Def, _) => DeclarationKind::Function,
        };
        let parent = parent.map(|s| s.index);

        if !signature.parsed {
            self.gap(line.line, GapReason::UnbalancedSignature);
        }

        let docstring = if signature.parsed {
            self.body_docstring(line, signature.inline_body.as_deref())
        } else {
            None
        };

        let index = self.emitted;
        self.emitted += 1;
        self.scopes.push(OpenScope {
            indent: line.indent,
            index,
            kind,
        });

        Declaration {
            kind,
            name: signature.name,
            parameters: signature.parameters,
            signature_parsed: signature.parsed,
            docstring,
            indent_level: line.indent,
            line: line.line,
            is_async: signature.is_async,
            decorators: std::mem::take(&mut self.decorators),
            parent,
        }
    }
}

fn decorator_name(statement: &str) -> String {
    let name = statement.trim_start_matches('@').trim_start();
    let end = name
        .find(|c: char| c == '(' || c.is_whitespace())
        .unwrap_or(name.len());
    name[..end].to_string()
}

impl Iterator for Scanner<'_> {
    type Item = Declaration;

    fn next(&mut self) -> Option<Declaration> {
        loop {
            let line = self.lines.next()?;

            if !self.started {
                self.started = true;
                match extract_docstring(&line.text) {
                    DocstringScan::Found(doc) => {
                        self.summary.module_docstring = Some(doc);
                        continue;
                    }
                    DocstringScan::Unterminated => {
                        self.gap(line.line, GapReason::UnterminatedDocstring);
                        continue;
                    }
                    DocstringScan::Absent => {}
                }
            }

            while self
                .scopes
                .last()
                .is_some_and(|scope| scope.indent >= line.indent)
            {
                self.scopes.pop();
            }

            if line.text.starts_with('@') {
                self.decorators.push(decorator_name(&line.text));
                continue;
            }

            if line.indent == 0 {
                if let Some(assignment) = parse_export_assignment(&line.text) {
                    let current = self.summary.exports.take();
                    self.summary.exports = exports::AllowList::apply(current, assignment);
                    self.decorators.clear();
                    continue;
                }
            }

            if !lines::starts_declaration(&line.text) {
                self.decorators.clear();
                continue;
            }

            match parse_signature(&line.text) {
                Ok(signature) => return Some(self.declare(&line, signature)),
                Err(SignatureError::NotADeclaration) => self.decorators.clear(),
                Err(e) => {
                    self.decorators.clear();
                    self.gap(line.line, GapReason::Unclassified(e));
                }
            }
        }
    }
}

/// Everything one scan yields, collected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannedModule {
    pub declarations: Vec<Declaration>,
    pub summary: ScanSummary,
}

/// Scan a whole unit eagerly.
pub fn scan(unit: &SourceUnit, options: &ScanOptions) -> ScannedModule {
    let mut scanner = unit.scan(options);
    let declarations: Vec<Declaration> = scanner.by_ref().collect();
    ScannedModule {
        declarations,
        summary: scanner.finish(),
    }
}
