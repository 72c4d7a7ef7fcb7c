//! Docstring detection and dedenting.

/// Outcome of looking for a docstring in a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocstringScan {
    /// A triple-quoted string, dedented.
    Found(String),
    /// The statement is not a triple-quoted string.
    Absent,
    /// The opening delimiter never closed.
    Unterminated,
}

const DELIMITERS: [&str; 2] = ["\"\"\"", "'''"];

/// Strip an optional `r`/`u` string prefix and return the opening delimiter
/// plus the text after it.
fn opening(statement: &str) -> Option<(&'static str, &str)> {
    let unprefixed = statement
        .strip_prefix(&['r', 'R', 'u', 'U'][..])
        .unwrap_or(statement);
    DELIMITERS
        .iter()
        .find_map(|delim| unprefixed.strip_prefix(*delim).map(|rest| (*delim, rest)))
}

/// Byte index of the closing delimiter, skipping backslash escapes.
fn closing(body: &str, delimiter: &str) -> Option<usize> {
    let mut chars = body.char_indices();
    while let Some((i, ch)) = chars.next() {
        if ch == '\\' {
            chars.next();
        } else if body[i..].starts_with(delimiter) {
            return Some(i);
        }
    }
    None
}

/// Look for a docstring at the start of `statement`, the first statement of
/// a body (or of a module).
///
/// The text between the delimiters is returned verbatim apart from one
/// layer of common indentation; see [`clean_docstring`].
pub fn extract_docstring(statement: &str) -> DocstringScan {
    let Some((delimiter, body)) = opening(statement.trim_start()) else {
        return DocstringScan::Absent;
    };
    match closing(body, delimiter) {
        Some(end) => DocstringScan::Found(clean_docstring(&body[..end])),
        None => DocstringScan::Unterminated,
    }
}

/// Remove the indentation a docstring inherits from its source position.
///
/// The first line (which follows the opening quotes) is left-stripped, the
/// remaining lines lose their smallest common indentation, and leading and
/// trailing blank lines are dropped.
pub fn clean_docstring(raw: &str) -> String {
    let mut lines = raw.lines();
    let first = lines.next().unwrap_or_default().trim_start();
    let rest: Vec<&str> = lines.collect();

    let margin = rest
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start_matches(&[' ', '\t'][..]).len())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<&str> = Vec::with_capacity(rest.len() + 1);
    cleaned.push(first.trim_end());
    for line in rest {
        let dedented = line.get(margin..).unwrap_or_else(|| line.trim_start());
        cleaned.push(dedented.trim_end());
    }

    while cleaned.first().is_some_and(|line| line.is_empty()) {
        cleaned.remove(0);
    }
    while cleaned.last().is_some_and(|line| line.is_empty()) {
        cleaned.pop();
    }

    cleaned.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_docstring() {
        assert_eq!(
            extract_docstring("\"\"\"Greet someone.\"\"\""),
            DocstringScan::Found("Greet someone.".into())
        );
        assert_eq!(
            extract_docstring("'''Single quotes.'''"),
            DocstringScan::Found("Single quotes.".into())
        );
    }

    #[test]
    fn test_multiline_docstring_is_dedented() {
        let statement = "\"\"\"\n        Summary line.\n\n        Details:\n            nested\n        \"\"\"";
        assert_eq!(
            extract_docstring(statement),
            DocstringScan::Found("Summary line.\n\nDetails:\n    nested".into())
        );
    }

    #[test]
    fn test_summary_on_opening_line() {
        let statement = "\"\"\"Summary.\n\n    More text.\n    \"\"\"";
        assert_eq!(
            extract_docstring(statement),
            DocstringScan::Found("Summary.\n\nMore text.".into())
        );
    }

    #[test]
    fn test_prefixed_and_escaped_quotes() {
        assert_eq!(
            extract_docstring("r\"\"\"Raw \\d+ pattern.\"\"\""),
            DocstringScan::Found("Raw \\d+ pattern.".into())
        );
        assert_eq!(
            extract_docstring("\"\"\"Says \\\"\"\"hi\\\"\"\" loudly.\"\"\""),
            DocstringScan::Found("Says \\\"\"\"hi\\\"\"\" loudly.".into())
        );
    }

    #[test]
    fn test_absent_for_other_statements() {
        assert_eq!(extract_docstring("return 1"), DocstringScan::Absent);
        assert_eq!(extract_docstring("\"single quoted\""), DocstringScan::Absent);
        assert_eq!(extract_docstring("x = \"\"\"not a docstring\"\"\""), DocstringScan::Absent);
    }

    #[test]
    fn test_unterminated() {
        assert_eq!(
            extract_docstring("\"\"\"never closed\n    x = 1"),
            DocstringScan::Unterminated
        );
    }
}
