//! Output formatting for docpy.
//!
//! Turns rendered Markdown into a styled HTML page, or documentation trees
//! into JSON for programmatic access.

use comrak::{markdown_to_html, ComrakOptions};
use serde::Serialize;
use thiserror::Error;

use crate::doctree::{DocNode, DocTree};
use crate::scanner::{Declaration, Parameter};

/// Errors that can occur during output formatting.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Markdown converted to a standalone HTML page (default).
    #[default]
    Html,
    /// Raw Markdown.
    Markdown,
    /// JSON for programmatic access.
    Json,
}

impl OutputFormat {
    /// File extension for pages written in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
        }
    }
}

// ============================================================================
// HTML
// ============================================================================

fn comrak_options() -> ComrakOptions<'static> {
    let mut options = ComrakOptions::default();
    options.extension.table = true;
    options.extension.autolink = true;
    // Docstring line breaks are meaningful.
    options.render.hardbreaks = true;
    // Module anchors are raw HTML; docstrings are escaped by the renderer.
    options.render.unsafe_ = true;
    options
}

/// Convert Markdown to an HTML fragment.
pub fn markdown_fragment(markdown: &str) -> String {
    markdown_to_html(markdown, &comrak_options())
}

/// Wrap an HTML fragment in the standalone page template.
pub fn html_page(title: &str, content: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<head>\n<meta charset=utf-8>\n<title>{} Documentation</title>\n\
         <link rel=\"stylesheet\" href=\"default.css\" type=\"text/css\">\n</head>\n<body>\n{}\n</body>\n</html>",
        escape_attribute(title),
        content.trim_end()
    )
}

fn escape_attribute(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Convert rendered Markdown to the requested page format.
///
/// JSON is not a page format; Markdown is returned unchanged for it.
pub fn format_page(title: &str, markdown: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Html => html_page(title, &markdown_fragment(markdown)),
        OutputFormat::Markdown | OutputFormat::Json => markdown.to_string(),
    }
}

// ============================================================================
// JSON
// ============================================================================

#[derive(Serialize)]
struct JsonModule {
    file: String,
    module: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    docstring: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exports: Option<Vec<String>>,
    declarations: Vec<JsonDeclaration>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    parse_gaps: Vec<JsonGap>,
}

#[derive(Serialize)]
struct JsonDeclaration {
    kind: String,
    name: String,
    line: usize,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    is_async: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    decorators: Vec<String>,
    parameters: Vec<JsonParameter>,
    signature_parsed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    docstring: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    members: Vec<JsonDeclaration>,
}

#[derive(Serialize)]
struct JsonParameter {
    name: String,
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    annotation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    variadic: bool,
}

#[derive(Serialize)]
struct JsonGap {
    line: usize,
    reason: String,
}

fn parameter_to_json(param: &Parameter) -> JsonParameter {
    JsonParameter {
        name: param.name.clone(),
        kind: param.kind.to_string(),
        annotation: param.annotation.clone(),
        default: param.default.clone(),
        variadic: param.is_variadic(),
    }
}

fn declaration_to_json(decl: &Declaration, children: &[DocNode]) -> JsonDeclaration {
    JsonDeclaration {
        kind: decl.kind.to_string(),
        name: decl.name.clone(),
        line: decl.line,
        is_async: decl.is_async,
        decorators: decl.decorators.to_vec(),
        parameters: decl.parameters.iter().map(parameter_to_json).collect(),
        signature_parsed: decl.signature_parsed,
        docstring: decl.docstring.clone(),
        members: children
            .iter()
            .map(|c| declaration_to_json(&c.declaration, &c.children))
            .collect(),
    }
}

fn module_to_json(tree: &DocTree) -> JsonModule {
    JsonModule {
        file: tree.file_name.clone(),
        module: tree.module_name().to_string(),
        docstring: tree.root.docstring.clone(),
        exports: tree.exports.as_ref().map(|list| list.names().to_vec()),
        declarations: tree
            .nodes
            .iter()
            .map(|n| declaration_to_json(&n.declaration, &n.children))
            .collect(),
        parse_gaps: tree
            .gaps
            .iter()
            .map(|g| JsonGap {
                line: g.line,
                reason: g.reason.to_string(),
            })
            .collect(),
    }
}

/// Serialize one module tree as pretty-printed JSON.
pub fn module_json(tree: &DocTree) -> Result<String, OutputError> {
    Ok(serde_json::to_string_pretty(&module_to_json(tree))?)
}

/// Serialize several module trees as a JSON document `{"modules": [...]}`.
pub fn modules_json<'a>(trees: impl IntoIterator<Item = &'a DocTree>) -> Result<String, OutputError> {
    #[derive(Serialize)]
    struct Output {
        modules: Vec<JsonModule>,
    }

    let output = Output {
        modules: trees.into_iter().map(module_to_json).collect(),
    };
    Ok(serde_json::to_string_pretty(&output)?)
}
