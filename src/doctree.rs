//! Hierarchical view of a scanned module.
//!
//! Rebuilds module → class → method nesting from the parent links the
//! scanner records on each declaration.

use crate::scanner::{scan, AllowList, Declaration, ParseGap, ScanOptions, SourceUnit};

/// A declaration and the declarations nested in its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocNode {
    pub declaration: Declaration,
    pub children: Vec<DocNode>,
}

impl DocNode {
    pub fn leaf(declaration: Declaration) -> Self {
        Self {
            declaration,
            children: Vec::new(),
        }
    }

    fn count(&self) -> usize {
        1 + self.children.iter().map(DocNode::count).sum::<usize>()
    }

    fn reverse_children(&mut self) {
        self.children.reverse();
        for child in &mut self.children {
            child.reverse_children();
        }
    }
}

/// Documentation tree of one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocTree {
    /// File name the module was read from, e.g. `utils.py`.
    pub file_name: String,
    /// Declaration of kind `Module` holding the module docstring.
    pub root: Declaration,
    /// Top-level classes and functions in source order.
    pub nodes: Vec<DocNode>,
    pub exports: Option<AllowList>,
    pub gaps: Vec<ParseGap>,
}

impl DocTree {
    /// Scan `unit` and build its tree.
    pub fn from_source(unit: &SourceUnit, options: &ScanOptions) -> Self {
        let scanned = scan(unit, options);
        let root = Declaration::module(unit.module_name(), scanned.summary.module_docstring);
        let mut tree = Self::build(unit.file_name(), root, scanned.declarations);
        tree.exports = scanned.summary.exports;
        tree.gaps = scanned.summary.gaps;
        tree
    }

    /// Assemble a tree from declarations in source order.
    ///
    /// A declaration whose parent index is out of range or not earlier in
    /// the sequence is treated as top-level.
    pub fn build(
        file_name: impl Into<String>,
        root: Declaration,
        declarations: impl IntoIterator<Item = Declaration>,
    ) -> Self {
        let mut slots: Vec<Option<DocNode>> = declarations
            .into_iter()
            .map(|d| Some(DocNode::leaf(d)))
            .collect();

        // Children come after their parents, so attach back to front.
        let mut nodes = Vec::new();
        for index in (0..slots.len()).rev() {
            let Some(node) = slots[index].take() else {
                continue;
            };
            match node.declaration.parent.filter(|&p| p < index) {
                Some(parent) => match slots[parent].as_mut() {
                    Some(parent) => parent.children.push(node),
                    None => nodes.push(node),
                },
                None => nodes.push(node),
            }
        }

        nodes.reverse();
        for node in &mut nodes {
            node.reverse_children();
        }

        Self {
            file_name: file_name.into(),
            root,
            nodes,
            exports: None,
            gaps: Vec::new(),
        }
    }

    pub fn module_name(&self) -> &str {
        &self.root.name
    }

    /// Number of declarations below the module root.
    pub fn len(&self) -> usize {
        self.nodes.iter().map(DocNode::count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True when there is anything to document: a module docstring or at
    /// least one declaration.
    pub fn has_content(&self) -> bool {
        self.root.is_documented() || !self.nodes.is_empty()
    }

    /// Pre-order walk yielding `(depth, declaration)`, top-level at depth 1.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Declaration)> {
        let mut stack: Vec<(usize, &DocNode)> =
            self.nodes.iter().rev().map(|n| (1, n)).collect();
        std::iter::from_fn(move || {
            let (depth, node) = stack.pop()?;
            stack.extend(node.children.iter().rev().map(|c| (depth + 1, c)));
            Some((depth, &node.declaration))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::DeclarationKind;

    fn tree(text: &str) -> DocTree {
        DocTree::from_source(&SourceUnit::new("pkg_mod.py", text), &ScanOptions::default())
    }

    #[test]
    fn test_builds_nesting_in_source_order() {
        let code = "\"\"\"Module.\"\"\"\nclass A:\n    def one(self):\n        pass\n    def two(self):\n        pass\ndef f():\n    pass\nclass B:\n    pass\n";
        let tree = tree(code);
        assert_eq!(tree.module_name(), "pkg_mod");
        assert_eq!(tree.file_name, "pkg_mod.py");
        assert_eq!(tree.root.kind, DeclarationKind::Module);
        assert_eq!(tree.root.docstring.as_deref(), Some("Module."));

        let top: Vec<_> = tree.nodes.iter().map(|n| n.declaration.name.as_str()).collect();
        assert_eq!(top, ["A", "f", "B"]);
        let methods: Vec<_> = tree.nodes[0]
            .children
            .iter()
            .map(|n| n.declaration.name.as_str())
            .collect();
        assert_eq!(methods, ["one", "two"]);
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn test_iter_is_preorder_with_depth() {
        let code = "class A:\n    def m(self):\n        def inner():\n            pass\ndef f():\n    pass\n";
        let tree = tree(code);
        let walk: Vec<_> = tree.iter().map(|(d, decl)| (d, decl.name.as_str())).collect();
        assert_eq!(walk, [(1, "A"), (2, "m"), (3, "inner"), (1, "f")]);
    }

    #[test]
    fn test_has_content() {
        assert!(!tree("x = 1\n").has_content());
        assert!(tree("\"\"\"Doc.\"\"\"\n").has_content());
        assert!(tree("def f():\n    pass\n").has_content());
    }

    #[test]
    fn test_dangling_parent_becomes_top_level() {
        let mut orphan = Declaration::module("orphan", None);
        orphan.kind = DeclarationKind::Function;
        orphan.parent = Some(7);
        let tree = DocTree::build("x.py", Declaration::module("x", None), vec![orphan]);
        assert_eq!(tree.nodes.len(), 1);
    }
}
