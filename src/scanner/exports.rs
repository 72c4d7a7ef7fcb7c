//! `__all__` export list parsing.

use serde::Serialize;

use super::lines::find_at_depth;

/// Names listed in a module-level `__all__`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AllowList {
    names: Vec<String>,
}

impl AllowList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::default();
        list.extend(names.into_iter().map(Into::into));
        list
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn extend(&mut self, names: impl IntoIterator<Item = String>) {
        for name in names {
            if !self.contains(&name) {
                self.names.push(name);
            }
        }
    }

    pub(crate) fn apply(current: Option<Self>, assignment: ExportAssignment) -> Option<Self> {
        match assignment {
            ExportAssignment::Replace(names) => Some(Self::new(names)),
            ExportAssignment::Extend(names) => {
                let mut list = current.unwrap_or_default();
                list.extend(names);
                Some(list)
            }
        }
    }
}

/// A statement that sets or grows `__all__`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ExportAssignment {
    Replace(Vec<String>),
    Extend(Vec<String>),
}

/// Recognize `__all__ = [...]`, `__all__: list[str] = (...)`,
/// `__all__ += [...]`, `__all__.extend([...])` and `__all__.append("x")`.
///
/// Computed values (`__all__ = base.__all__ + [...]`) are not understood
/// and yield `None`.
pub(crate) fn parse_export_assignment(statement: &str) -> Option<ExportAssignment> {
    let rest = statement.strip_prefix("__all__")?;
    if rest.starts_with(|c: char| c == '_' || c.is_alphanumeric()) {
        return None;
    }
    let rest = rest.trim_start();

    if let Some(value) = rest
        .strip_prefix(".extend(")
        .or_else(|| rest.strip_prefix(".append("))
    {
        return Some(ExportAssignment::Extend(string_literals(value)));
    }

    if let Some(value) = rest.strip_prefix("+=") {
        return literal_sequence(value).map(ExportAssignment::Extend);
    }

    let value = match rest.strip_prefix(':') {
        Some(annotated) => {
            let eq = find_at_depth(annotated, 0, |_, c| c == '=')?;
            &annotated[eq + 1..]
        }
        None => rest.strip_prefix('=').filter(|v| !v.starts_with('='))?,
    };
    literal_sequence(value).map(ExportAssignment::Replace)
}

fn literal_sequence(value: &str) -> Option<Vec<String>> {
    let value = value.trim_start();
    value
        .starts_with(&['[', '('][..])
        .then(|| string_literals(value))
}

/// Contents of every quoted string in `text`.
fn string_literals(text: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find(&['"', '\''][..]) {
        let quote = &rest[open..open + 1];
        let body = &rest[open + 1..];
        let Some(close) = body.find(quote) else {
            break;
        };
        let name = body[..close].trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
        rest = &body[close + 1..];
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_and_tuple_assignment() {
        assert_eq!(
            parse_export_assignment("__all__ = ['A', \"b_func\"]"),
            Some(ExportAssignment::Replace(vec!["A".into(), "b_func".into()]))
        );
        assert_eq!(
            parse_export_assignment("__all__ = (\n    'A',\n    'B',\n)"),
            Some(ExportAssignment::Replace(vec!["A".into(), "B".into()]))
        );
        assert_eq!(
            parse_export_assignment("__all__: list[str] = ['A']"),
            Some(ExportAssignment::Replace(vec!["A".into()]))
        );
    }

    #[test]
    fn test_extensions() {
        assert_eq!(
            parse_export_assignment("__all__ += ['C']"),
            Some(ExportAssignment::Extend(vec!["C".into()]))
        );
        assert_eq!(
            parse_export_assignment("__all__.append('D')"),
            Some(ExportAssignment::Extend(vec!["D".into()]))
        );
        assert_eq!(
            parse_export_assignment("__all__.extend(['E', 'F'])"),
            Some(ExportAssignment::Extend(vec!["E".into(), "F".into()]))
        );
    }

    #[test]
    fn test_unrecognized_statements() {
        assert_eq!(parse_export_assignment("__all__ = base.__all__ + ['X']"), None);
        assert_eq!(parse_export_assignment("__all__ == ['X']"), None);
        assert_eq!(parse_export_assignment("__all_names__ = ['X']"), None);
        assert_eq!(parse_export_assignment("x = ['X']"), None);
    }

    #[test]
    fn test_apply_extends_existing_list() {
        let list = AllowList::apply(None, ExportAssignment::Replace(vec!["A".into()]));
        let list = AllowList::apply(list, ExportAssignment::Extend(vec!["B".into(), "A".into()]));
        let list = list.unwrap();
        assert_eq!(list.names(), ["A", "B"]);
        assert!(list.contains("B"));
        assert!(!list.contains("C"));
    }
}
