//! Logical line reader.
//!
//! Joins physical lines into logical statements the way Python does
//! (open brackets, open triple-quoted strings, trailing backslash) and
//! measures the indentation of each statement with tabs expanded.

use std::iter::{Enumerate, Peekable};
use std::str::Lines;

/// Tab width used when a caller does not configure one.
pub const DEFAULT_TAB_WIDTH: usize = 4;

/// One logical statement of a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    /// 1-indexed first physical line.
    pub line: usize,
    /// 1-indexed last physical line (inclusive).
    pub end_line: usize,
    /// Indentation column of the first physical line, tabs expanded.
    pub indent: usize,
    /// Statement text. The first physical line is stripped of its
    /// indentation; continuation lines are kept raw, joined with `\n`.
    pub text: String,
    /// Brackets or a string literal were still open when the join stopped.
    pub unterminated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    Single(char),
    Triple(char),
}

impl Quote {
    fn delimiter(self) -> &'static str {
        match self {
            Quote::Single('"') => "\"",
            Quote::Single(_) => "'",
            Quote::Triple('"') => "\"\"\"",
            Quote::Triple(_) => "'''",
        }
    }
}

/// Bracket and string-literal state carried across chunks of text.
#[derive(Debug, Clone, Default)]
pub(crate) struct Nesting {
    depth: usize,
    open: Option<Quote>,
}

impl Nesting {
    /// True when no bracket and no string literal is open.
    pub(crate) fn is_balanced(&self) -> bool {
        self.depth == 0 && self.open.is_none()
    }

    /// True while inside a string literal.
    pub(crate) fn in_string(&self) -> bool {
        self.open.is_some()
    }

    pub(crate) fn feed(&mut self, text: &str) {
        self.feed_with(text, |_, _, _| true);
    }

    /// Advance over `text`, calling `visit(byte_index, ch, depth)` for every
    /// character outside string literals and comments. `depth` is the
    /// bracket depth before `ch` is applied. A `#` that starts a comment is
    /// visited, the rest of the comment is not.
    ///
    /// Returns false if `visit` stopped the walk early.
    pub(crate) fn feed_with<F>(&mut self, text: &str, mut visit: F) -> bool
    where
        F: FnMut(usize, char, usize) -> bool,
    {
        let mut chars = text.char_indices().peekable();

        while let Some((i, ch)) = chars.next() {
            if let Some(quote) = self.open {
                match ch {
                    '\\' => {
                        chars.next();
                    }
                    '\n' if matches!(quote, Quote::Single(_)) => self.open = None,
                    _ if text[i..].starts_with(quote.delimiter()) => {
                        for _ in 1..quote.delimiter().len() {
                            chars.next();
                        }
                        self.open = None;
                    }
                    _ => {}
                }
                continue;
            }

            match ch {
                '#' => {
                    if !visit(i, ch, self.depth) {
                        return false;
                    }
                    while chars.peek().is_some_and(|&(_, c)| c != '\n') {
                        chars.next();
                    }
                }
                '"' | '\'' => {
                    let triple = Quote::Triple(ch);
                    if text[i..].starts_with(triple.delimiter()) {
                        chars.next();
                        chars.next();
                        self.open = Some(triple);
                    } else {
                        self.open = Some(Quote::Single(ch));
                    }
                }
                _ => {
                    if !visit(i, ch, self.depth) {
                        return false;
                    }
                    match ch {
                        '(' | '[' | '{' => self.depth += 1,
                        ')' | ']' | '}' => self.depth = self.depth.saturating_sub(1),
                        _ => {}
                    }
                }
            }
        }

        // Short strings cannot run past the end of a physical line.
        if matches!(self.open, Some(Quote::Single(_))) {
            self.open = None;
        }

        true
    }
}

/// Byte index of the first character outside strings and comments, at
/// bracket depth `depth`, for which `pred` holds.
pub(crate) fn find_at_depth<P>(text: &str, depth: usize, mut pred: P) -> Option<usize>
where
    P: FnMut(usize, char) -> bool,
{
    let mut found = None;
    Nesting::default().feed_with(text, |i, ch, d| {
        if d == depth && ch != '#' && pred(i, ch) {
            found = Some(i);
            return false;
        }
        true
    });
    found
}

/// Split on `separator` where it occurs outside brackets and strings.
pub(crate) fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    Nesting::default().feed_with(text, |i, ch, depth| {
        if ch == separator && depth == 0 {
            parts.push(&text[start..i]);
            start = i + ch.len_utf8();
        }
        true
    });
    parts.push(&text[start..]);
    parts
}

/// Remove `#` comments, leaving string literals intact.
pub(crate) fn strip_comments(text: &str) -> String {
    let mut comments = Vec::new();
    Nesting::default().feed_with(text, |i, ch, _| {
        if ch == '#' {
            comments.push(i);
        }
        true
    });

    if comments.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut start = 0;
    for begin in comments {
        out.push_str(&text[start..begin]);
        start = text[begin..].find('\n').map_or(text.len(), |n| begin + n);
    }
    out.push_str(&text[start..]);
    out
}

/// Indentation column of `line`, with tabs advancing to the next multiple
/// of `tab_width`.
pub fn measure_indent(line: &str, tab_width: usize) -> usize {
    let tab_width = tab_width.max(1);
    let mut column = 0;
    for ch in line.chars() {
        match ch {
            ' ' => column += 1,
            '\t' => column = (column / tab_width + 1) * tab_width,
            '\x0c' => column = 0,
            _ => break,
        }
    }
    column
}

/// True when a stripped line opens a `def`, `async def` or `class`.
pub(crate) fn starts_declaration(stripped: &str) -> bool {
    let keyword = |kw: &str| {
        stripped
            .strip_prefix(kw)
            .is_some_and(|rest| rest.starts_with(char::is_whitespace))
    };
    keyword("def") || keyword("class") || keyword("async")
}

/// Iterator over the logical lines of a source text.
pub struct LogicalLines<'a> {
    lines: Peekable<Enumerate<Lines<'a>>>,
    tab_width: usize,
}

impl<'a> LogicalLines<'a> {
    pub fn new(text: &'a str, tab_width: usize) -> Self {
        Self {
            lines: text.lines().enumerate().peekable(),
            tab_width,
        }
    }

    /// An open bracket must not swallow the next declaration.
    fn stops_join(&mut self, indent: usize, nesting: &Nesting) -> bool {
        if nesting.in_string() {
            return false;
        }
        let Some(&(_, next)) = self.lines.peek() else {
            return false;
        };
        let stripped = next.trim_start();
        (starts_declaration(stripped) || stripped.starts_with('@'))
            && measure_indent(next, self.tab_width) <= indent
    }
}

impl Iterator for LogicalLines<'_> {
    type Item = LogicalLine;

    fn next(&mut self) -> Option<LogicalLine> {
        loop {
            let (index, raw) = self.lines.next()?;
            let stripped = raw.trim_start();
            if stripped.is_empty() || stripped.starts_with('#') {
                continue;
            }

            let indent = measure_indent(raw, self.tab_width);
            let mut nesting = Nesting::default();
            nesting.feed(stripped);

            let mut text = stripped.trim_end().to_string();
            let mut end = index;
            let mut unterminated = false;

            loop {
                // A backslash inside a trailing comment does not continue the line.
                let continued =
                    nesting.is_balanced() && strip_comments(&text).trim_end().ends_with('\\');
                if nesting.is_balanced() && !continued {
                    break;
                }
                if !continued && self.stops_join(indent, &nesting) {
                    unterminated = true;
                    break;
                }
                let Some((next_index, next_raw)) = self.lines.next() else {
                    unterminated = !nesting.is_balanced();
                    break;
                };
                nesting.feed(next_raw);
                text.push('\n');
                text.push_str(next_raw);
                end = next_index;
            }

            return Some(LogicalLine {
                line: index + 1,
                end_line: end + 1,
                indent,
                text,
                unterminated,
            });
        }
    }
}
