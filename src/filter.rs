//! Visibility and scope filtering.
//!
//! Decides which declarations of a [`DocTree`] are documented:
//!
//! 1. With an `__all__` list, top-level names outside it are dropped.
//! 2. Names starting with `_` are private, except the constructor.
//! 3. Unless disabled, declarations without a docstring are dropped.
//!
//! Only module → class → method and module → function are documented;
//! anything nested deeper is dropped with its container's body.

use crate::doctree::{DocNode, DocTree};
use crate::scanner::{AllowList, DeclarationKind};

/// Options for the visibility filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOptions {
    /// Skip objects without a docstring.
    pub ignore_undocumented: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            ignore_undocumented: true,
        }
    }
}

impl FilterOptions {
    /// Document undocumented objects too.
    pub fn document_all() -> Self {
        Self {
            ignore_undocumented: false,
        }
    }

    fn passes_gate(&self, node: &DocNode) -> bool {
        !self.ignore_undocumented || node.declaration.is_documented()
    }
}

/// Apply the visibility rules, preserving source order.
pub fn filter_tree(mut tree: DocTree, options: &FilterOptions) -> DocTree {
    let exports = tree.exports.clone();
    tree.nodes = std::mem::take(&mut tree.nodes)
        .into_iter()
        .filter_map(|node| keep_top_level(node, exports.as_ref(), options))
        .collect();
    tree
}

fn keep_top_level(
    mut node: DocNode,
    exports: Option<&AllowList>,
    options: &FilterOptions,
) -> Option<DocNode> {
    let decl = &node.declaration;
    if exports.is_some_and(|list| !list.contains(&decl.name)) {
        return None;
    }
    if decl.is_private() || !options.passes_gate(&node) {
        return None;
    }

    match node.declaration.kind {
        DeclarationKind::Class => {
            node.children = std::mem::take(&mut node.children)
                .into_iter()
                .filter_map(|child| keep_method(child, options))
                .collect();
            Some(node)
        }
        DeclarationKind::Function => {
            node.children.clear();
            Some(node)
        }
        DeclarationKind::Method | DeclarationKind::Module => None,
    }
}

fn keep_method(mut node: DocNode, options: &FilterOptions) -> Option<DocNode> {
    if node.declaration.kind != DeclarationKind::Method {
        return None;
    }
    if node.declaration.is_private() || !options.passes_gate(&node) {
        return None;
    }
    node.children.clear();
    Some(node)
}
