//! Declaration header tokenizer.
//!
//! Splits `def name(params) -> ret:` and `class Name(bases):` headers into a
//! name and an ordered parameter list. Parameters are separated on
//! top-level commas only.

use smallvec::SmallVec;
use thiserror::Error;

use super::lines::{find_at_depth, split_top_level, strip_comments};
use super::{Parameter, ParameterKind};

/// Keyword that opened a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Def,
    Class,
}

/// A tokenized declaration header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub keyword: Keyword,
    pub name: String,
    pub parameters: SmallVec<[Parameter; 4]>,
    /// False when the parameter list never closed; `parameters` is empty.
    pub parsed: bool,
    pub is_async: bool,
    /// Statement following the colon on the header line (`def f(): pass`).
    pub inline_body: Option<String>,
}

/// Reasons a line that starts like a declaration is not one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("not a declaration")]
    NotADeclaration,

    #[error("missing or invalid declaration name")]
    MissingName,

    #[error("expected `(` after function name")]
    MissingParameters,

    #[error("expected `:` after declaration header")]
    MissingColon,
}

fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(keyword)?;
    rest.starts_with(char::is_whitespace)
        .then(|| rest.trim_start())
}

fn is_identifier_char(ch: char) -> bool {
    ch == '_' || ch.is_alphanumeric()
}

/// Tokenize a declaration header, possibly spanning several physical lines.
///
/// An unbalanced parameter list is not an error: the signature comes back
/// with `parsed == false` and no parameters.
pub fn parse_signature(header: &str) -> Result<Signature, SignatureError> {
    let header = strip_comments(header);
    let mut rest = header.trim();

    let is_async = match strip_keyword(rest, "async") {
        Some(after) => {
            rest = after;
            true
        }
        None => false,
    };

    let keyword = if let Some(after) = strip_keyword(rest, "def") {
        rest = after;
        Keyword::Def
    } else if let Some(after) = strip_keyword(rest, "class").filter(|_| !is_async) {
        rest = after;
        Keyword::Class
    } else {
        return Err(SignatureError::NotADeclaration);
    };

    let name_len = rest
        .find(|c: char| !is_identifier_char(c))
        .unwrap_or(rest.len());
    let name = &rest[..name_len];
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(SignatureError::MissingName);
    }
    rest = rest[name_len..].trim_start();

    let mut parameters = SmallVec::new();
    // Type parameter list (`def f[T](x):`) is not documented.
    if rest.starts_with('[') {
        let Some(close) = find_at_depth(rest, 1, |_, c| c == ']') else {
            return Ok(Signature {
                keyword,
                name: name.to_string(),
                parameters,
                parsed: false,
                is_async,
                inline_body: None,
            });
        };
        rest = rest[close + 1..].trim_start();
    }
    if rest.starts_with('(') {
        let Some(close) = find_at_depth(rest, 1, |_, c| c == ')') else {
            return Ok(Signature {
                keyword,
                name: name.to_string(),
                parameters,
                parsed: false,
                is_async,
                inline_body: None,
            });
        };
        parameters = split_parameters(&rest[1..close]);
        rest = &rest[close + 1..];
    } else if keyword == Keyword::Def {
        return Err(SignatureError::MissingParameters);
    }

    let colon = find_at_depth(rest, 0, |_, c| c == ':').ok_or(SignatureError::MissingColon)?;
    let inline_body = Some(rest[colon + 1..].trim())
        .filter(|body| !body.is_empty())
        .map(str::to_string);

    Ok(Signature {
        keyword,
        name: name.to_string(),
        parameters,
        parsed: true,
        is_async,
        inline_body,
    })
}

/// Split the text between the parentheses of a header into parameters.
pub fn split_parameters(list: &str) -> SmallVec<[Parameter; 4]> {
    split_top_level(list, ',')
        .into_iter()
        .filter_map(parse_parameter)
        .collect()
}

/// Position of the `=` that introduces a default, skipping comparison
/// operators inside the default expression.
fn find_default(text: &str) -> Option<usize> {
    find_at_depth(text, 0, |i, c| {
        c == '='
            && !text[i + 1..].starts_with('=')
            && !text[..i].ends_with(&['=', '<', '>', '!', ':'][..])
    })
}

fn parse_parameter(raw: &str) -> Option<Parameter> {
    let raw = raw.trim();
    match raw {
        "" => return None,
        "*" => return Some(Parameter::marker(ParameterKind::KeywordOnlyMarker)),
        "/" => return Some(Parameter::marker(ParameterKind::PositionalOnlyMarker)),
        _ => {}
    }

    let (target, default) = match find_default(raw) {
        Some(eq) => (raw[..eq].trim(), Some(collapse_lines(raw[eq + 1..].trim()))),
        None => (raw, None),
    };

    let (kind, target) = if let Some(name) = target.strip_prefix("**") {
        (ParameterKind::VariadicKeyword, name)
    } else if let Some(name) = target.strip_prefix('*') {
        (ParameterKind::VariadicPositional, name)
    } else if default.is_some() {
        (ParameterKind::Keyword, target)
    } else {
        (ParameterKind::Positional, target)
    };

    let (name, annotation) = match find_at_depth(target, 0, |_, c| c == ':') {
        Some(colon) => (
            target[..colon].trim(),
            Some(collapse_lines(target[colon + 1..].trim())),
        ),
        None => (target.trim(), None),
    };

    Some(Parameter {
        name: name.to_string(),
        annotation,
        default,
        kind,
    })
}

/// Fold a value written over several physical lines onto one line.
fn collapse_lines(text: &str) -> String {
    if !text.contains('\n') {
        return text.to_string();
    }
    text.split('\n')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
