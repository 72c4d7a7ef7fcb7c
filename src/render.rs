//! Markdown rendering of filtered documentation trees.
//!
//! Every underscore in docstrings is escaped so that names like
//! `do_this_now` do not turn into emphasis, except inside inline code
//! spans, which pass through untouched.

use std::fmt;

use crate::doctree::{DocNode, DocTree};
use crate::scanner::{Declaration, DeclarationKind, ParameterKind};

/// Options for Markdown rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Emit `<a id="file.py"></a>` before the module heading so package
    /// pages can link to each module.
    pub anchor: bool,
    /// Escape `&`, `<` and `>` in docstrings outside code spans, for
    /// output that is converted to HTML with raw HTML enabled.
    pub escape_html: bool,
}

/// Rendered Markdown, one block per documented entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedDoc {
    blocks: Vec<String>,
}

impl RenderedDoc {
    pub fn blocks(&self) -> &[String] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The whole document.
    pub fn to_markdown(&self) -> String {
        self.to_string()
    }

    /// The document without the module heading line.
    pub fn body(&self) -> String {
        let mut blocks = self.blocks.iter();
        let mut parts: Vec<&str> = Vec::with_capacity(self.blocks.len());
        if let Some(first) = blocks.next() {
            if let Some((_, doc)) = first.split_once("\n\n") {
                parts.push(doc);
            }
        }
        parts.extend(blocks.map(String::as_str));

        if parts.is_empty() {
            return String::new();
        }
        let mut out = parts.join("\n\n");
        out.push('\n');
        out
    }
}

impl fmt::Display for RenderedDoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.blocks.is_empty() {
            return Ok(());
        }
        writeln!(f, "{}", self.blocks.join("\n\n"))
    }
}

/// Escape underscores for use in headings.
pub fn escape_name(name: &str) -> String {
    name.replace('_', "\\_")
}

/// Escape underscores and asterisks inside an italic parameter list, and
/// HTML special characters when `html` is set.
fn escape_inline(text: &str, html: bool) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            '_' | '*' => {
                out.push('\\');
                out.push(ch);
            }
            '&' if html => out.push_str("&amp;"),
            '<' if html => out.push_str("&lt;"),
            '>' if html => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn push_escaped(text: &str, out: &mut String, html: bool) {
    for ch in text.chars() {
        match ch {
            '_' => out.push_str("\\_"),
            '&' if html => out.push_str("&amp;"),
            '<' if html => out.push_str("&lt;"),
            '>' if html => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

fn backtick_run(text: &str) -> usize {
    text.bytes().take_while(|&b| b == b'`').count()
}

/// Start of the first backtick run in `text` exactly `len` long.
fn closing_run(text: &str, len: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'`' {
            let run = backtick_run(&text[i..]);
            if run == len {
                return Some(i);
            }
            i += run;
        } else {
            i += 1;
        }
    }
    None
}

fn escape_line(line: &str, out: &mut String, html: bool) {
    let mut rest = line;
    while let Some(open) = rest.find('`') {
        push_escaped(&rest[..open], out, html);
        let run = backtick_run(&rest[open..]);
        let after = &rest[open + run..];
        match closing_run(after, run) {
            Some(close) => {
                out.push_str(&rest[open..open + run + close + run]);
                rest = &after[close + run..];
            }
            None => {
                out.push_str(&rest[open..open + run]);
                rest = after;
            }
        }
    }
    push_escaped(rest, out, html);
}

/// Escape every `_` as `\_`, except inside inline code spans.
///
/// A span opens with a run of backticks and closes at the next run of the
/// same length on the same line. Unclosed runs are plain text.
pub fn escape_underscores(text: &str) -> String {
    escape_docstring(text, false)
}

/// [`escape_underscores`], optionally also escaping HTML special
/// characters outside code spans.
pub fn escape_docstring(text: &str, html: bool) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        escape_line(line, &mut out, html);
    }
    out
}

/// Italic parameter list, or `...` when the signature could not be parsed.
fn format_parameters(decl: &Declaration, html: bool) -> String {
    if !decl.signature_parsed {
        return "...".to_string();
    }

    let mut params = decl.parameters.iter().peekable();
    if decl.kind == DeclarationKind::Method {
        if let Some(first) = params.peek() {
            if first.kind == ParameterKind::Positional && (first.name == "self" || first.name == "cls") {
                params.next();
            }
        }
    }

    let list = params.map(|p| p.to_string()).collect::<Vec<_>>().join(", ");
    if list.is_empty() {
        String::new()
    } else {
        format!("_{}_", escape_inline(&list, html))
    }
}

fn with_docstring(heading: String, decl: &Declaration, options: &RenderOptions) -> String {
    match decl.docstring.as_deref().filter(|doc| !doc.trim().is_empty()) {
        Some(doc) => format!("{}\n\n{}", heading, escape_docstring(doc, options.escape_html)),
        None => heading,
    }
}

fn render_class(module: &str, decl: &Declaration, options: &RenderOptions) -> String {
    let bases = if decl.signature_parsed && decl.parameters.is_empty() {
        String::new()
    } else {
        format!("({})", format_parameters(decl, options.escape_html))
    };
    let heading = format!(
        "#### _class_ {}.**{}**{}",
        module,
        escape_name(&decl.name),
        bases
    );
    with_docstring(heading, decl, options)
}

fn render_callable(
    level: &str,
    qualifier: &str,
    decl: &Declaration,
    options: &RenderOptions,
) -> String {
    let prefix = if decl.is_async { "_async_ " } else { "" };
    let heading = format!(
        "{} {}{}.**{}**({})",
        level,
        prefix,
        qualifier,
        escape_name(&decl.name),
        format_parameters(decl, options.escape_html)
    );
    with_docstring(heading, decl, options)
}

fn render_node(module: &str, node: &DocNode, options: &RenderOptions, blocks: &mut Vec<String>) {
    let decl = &node.declaration;
    match decl.kind {
        DeclarationKind::Class => {
            blocks.push(render_class(module, decl, options));
            let qualifier = format!("{}.{}", module, escape_name(&decl.name));
            for method in &node.children {
                if method.declaration.kind == DeclarationKind::Method {
                    blocks.push(render_callable("#####", &qualifier, &method.declaration, options));
                }
            }
        }
        DeclarationKind::Function => blocks.push(render_callable("####", module, decl, options)),
        DeclarationKind::Method | DeclarationKind::Module => {}
    }
}

fn section_title(kind: DeclarationKind) -> Option<&'static str> {
    match kind {
        DeclarationKind::Class => Some("### Classes"),
        DeclarationKind::Function => Some("### Functions"),
        DeclarationKind::Method | DeclarationKind::Module => None,
    }
}

/// Render a (filtered) tree to Markdown.
///
/// Top-level entries stay in source order, so a `### Classes` or
/// `### Functions` title is emitted each time the kind changes; interleaved
/// classes and functions repeat the titles.
///
/// The output depends only on the tree and options: rendering the same
/// tree twice gives identical text.
pub fn render_markdown(tree: &DocTree, options: &RenderOptions) -> RenderedDoc {
    let module = escape_name(tree.module_name());
    let mut blocks = Vec::with_capacity(tree.len() + 3);

    let anchor = if options.anchor {
        format!("<a id=\"{}\"></a>", tree.file_name)
    } else {
        String::new()
    };
    let heading = format!("## {}{}", anchor, escape_name(&tree.file_name));
    blocks.push(with_docstring(heading, &tree.root, options));

    let mut section = None;
    for node in &tree.nodes {
        let kind = node.declaration.kind;
        if section != Some(kind) {
            if let Some(title) = section_title(kind) {
                blocks.push(title.to_string());
                section = Some(kind);
            }
        }
        render_node(&module, node, options, &mut blocks);
    }

    RenderedDoc { blocks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{filter_tree, FilterOptions};
    use crate::scanner::{ScanOptions, SourceUnit};

    fn render(text: &str) -> RenderedDoc {
        let tree = DocTree::from_source(&SourceUnit::new("my_mod.py", text), &ScanOptions::default());
        let tree = filter_tree(tree, &FilterOptions::default());
        render_markdown(&tree, &RenderOptions::default())
    }

    #[test]
    fn test_escape_plain_underscores() {
        assert_eq!(escape_underscores("this_is_a_test"), "this\\_is\\_a\\_test");
    }

    #[test]
    fn test_code_spans_pass_through() {
        assert_eq!(escape_underscores("`do_not_escape`"), "`do_not_escape`");
        assert_eq!(
            escape_underscores("a_b `c_d` e_f `g_h`"),
            "a\\_b `c_d` e\\_f `g_h`"
        );
    }

    #[test]
    fn test_unclosed_span_is_escaped() {
        assert_eq!(escape_underscores("use `my_var here"), "use `my\\_var here");
        assert_eq!(
            escape_underscores("`open_one\nclosed_two`"),
            "`open\\_one\nclosed\\_two`"
        );
    }

    #[test]
    fn test_html_escaping_skips_code_spans() {
        assert_eq!(
            escape_docstring("List<int> & `Map<k_v>`", true),
            "List&lt;int&gt; &amp; `Map<k_v>`"
        );
        assert_eq!(escape_docstring("a<b", false), "a<b");
    }

    #[test]
    fn test_html_escaping_in_parameter_lists() {
        let code = "def f(sep=\"<br>\", t: \"List<int>\" = None, a=1 & 2):\n    \"\"\"Doc.\"\"\"\n";
        let tree = DocTree::from_source(&SourceUnit::new("m.py", code), &ScanOptions::default());
        let tree = filter_tree(tree, &FilterOptions::default());

        let options = RenderOptions {
            escape_html: true,
            ..Default::default()
        };
        let doc = render_markdown(&tree, &options);
        assert_eq!(
            doc.blocks()[2],
            "#### m.**f**(_sep=\"&lt;br&gt;\", t: \"List&lt;int&gt;\" = None, a=1 &amp; 2_)\n\nDoc."
        );

        let doc = render_markdown(&tree, &RenderOptions::default());
        assert!(doc.blocks()[2].contains("sep=\"<br>\""));
    }

    #[test]
    fn test_section_titles_follow_kind_changes() {
        let code = "class A:\n    \"\"\"A.\"\"\"\ndef f():\n    \"\"\"F.\"\"\"\nclass B:\n    \"\"\"B.\"\"\"\nclass C:\n    \"\"\"C.\"\"\"\n";
        let titles: Vec<_> = render(code)
            .blocks()
            .iter()
            .filter(|b| b.starts_with("### "))
            .cloned()
            .collect();
        assert_eq!(titles, ["### Classes", "### Functions", "### Classes"]);
    }

    #[test]
    fn test_double_backtick_spans() {
        assert_eq!(
            escape_underscores("``has `tick` and_under`` x_y"),
            "``has `tick` and_under`` x\\_y"
        );
        assert_eq!(escape_underscores("` a_b ``"), "` a\\_b ``");
    }

    #[test]
    fn test_module_class_and_method_headings() {
        let code = r#""""Module doc_string."""

class Foo_Bar(Base):
    """Class doc."""

    def __init__(self, a, b=1):
        """Make a `new_thing`."""

    def run(self, *args, **kw_args):
        """Run it."""

async def fetch(url, *, timeout=None):
    """Fetch the_url."""
"#;
        let doc = render(code);
        let blocks = doc.blocks();
        assert_eq!(blocks[0], "## my\\_mod.py\n\nModule doc\\_string.");
        assert_eq!(blocks[1], "### Classes");
        assert_eq!(blocks[2], "#### _class_ my\\_mod.**Foo\\_Bar**(_Base_)\n\nClass doc.");
        assert_eq!(
            blocks[3],
            "##### my\\_mod.Foo\\_Bar.**\\_\\_init\\_\\_**(_a, b=1_)\n\nMake a `new_thing`."
        );
        assert_eq!(
            blocks[4],
            "##### my\\_mod.Foo\\_Bar.**run**(_\\*args, \\*\\*kw\\_args_)\n\nRun it."
        );
        assert_eq!(blocks[5], "### Functions");
        assert_eq!(
            blocks[6],
            "#### _async_ my\\_mod.**fetch**(_url, \\*, timeout=None_)\n\nFetch the\\_url."
        );
        assert_eq!(blocks.len(), 7);
    }

    #[test]
    fn test_empty_parameters_and_unparsed_signature() {
        let code = "def nothing():\n    \"\"\"Nothing.\"\"\"\nclass Plain:\n    \"\"\"Plain.\"\"\"\n";
        let doc = render(code);
        assert!(doc.blocks()[2].starts_with("#### my\\_mod.**nothing**()"));
        assert!(doc.blocks()[4].starts_with("#### _class_ my\\_mod.**Plain**\n"));

        let broken = DocTree::from_source(
            &SourceUnit::new("b.py", "def broken(a,:\n    pass\ndef next_one():\n    pass\n"),
            &ScanOptions::default(),
        );
        let broken = filter_tree(broken, &FilterOptions::document_all());
        let doc = render_markdown(&broken, &RenderOptions::default());
        assert_eq!(doc.blocks()[2], "#### b.**broken**(...)");
    }

    #[test]
    fn test_anchor_and_body() {
        let tree = DocTree::from_source(
            &SourceUnit::new("__init__.py", "\"\"\"Package doc.\"\"\"\ndef f():\n    \"\"\"F.\"\"\"\n"),
            &ScanOptions::default(),
        );
        let options = RenderOptions {
            anchor: true,
            ..Default::default()
        };
        let doc = render_markdown(&tree, &options);
        assert_eq!(
            doc.blocks()[0],
            "## <a id=\"__init__.py\"></a>\\_\\_init\\_\\_.py\n\nPackage doc."
        );
        assert_eq!(
            doc.body(),
            "Package doc.\n\n### Functions\n\n#### \\_\\_init\\_\\_.**f**()\n\nF.\n"
        );
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let code = "class A:\n    \"\"\"A_doc.\"\"\"\n    def m(self, x=(1, 2)):\n        \"\"\"M.\"\"\"\n";
        let first = render(code).to_markdown();
        let second = render(code).to_markdown();
        assert_eq!(first, second);
        assert!(first.ends_with("M.\n"));
    }

    #[test]
    fn test_private_absent_and_constructor_present() {
        let code = "class A:\n    \"\"\"A.\"\"\"\n    def __init__(self):\n        \"\"\"Init.\"\"\"\n    def _helper(self):\n        \"\"\"Helper.\"\"\"\n";
        let md = render(code).to_markdown();
        assert!(md.contains("\\_\\_init\\_\\_"));
        assert!(!md.contains("helper"));
    }
}
