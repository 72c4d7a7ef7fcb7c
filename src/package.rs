//! Package pages.
//!
//! Groups documented modules by directory and assembles one page per
//! directory: a title, the package docstring from `__init__.py`, links to
//! sub-package pages and to each module's anchor, then the module documents.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::render::{escape_name, RenderedDoc};

/// File name of a package's initializer module.
pub const PACKAGE_INIT: &str = "__init__.py";

/// A rendered module placed in the package layout.
#[derive(Debug, Clone)]
pub struct ModulePage {
    /// Directory relative to the package's parent, e.g. `pkg/sub`.
    pub rel_dir: PathBuf,
    /// Module file name, e.g. `util.py`.
    pub file_name: String,
    pub rendered: RenderedDoc,
}

/// One assembled documentation page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Page file name, e.g. `pkg_sub.html`.
    pub file_name: String,
    /// Directory the page documents, e.g. `pkg/sub`.
    pub title: String,
    pub markdown: String,
}

/// Page stem for a relative directory: components joined with `_`.
pub fn page_stem(rel_dir: &Path) -> String {
    rel_dir
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("_")
}

fn display_dir(rel_dir: &Path) -> String {
    rel_dir
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Assemble pages from rendered modules.
///
/// Every directory holding at least one module gets a page. Pages come out
/// sorted by directory and modules within a page by file name, so the
/// result does not depend on the order of `modules`.
pub fn assemble_pages(modules: Vec<ModulePage>, extension: &str) -> Vec<Page> {
    let mut by_dir: BTreeMap<PathBuf, Vec<ModulePage>> = BTreeMap::new();
    for module in modules {
        by_dir.entry(module.rel_dir.clone()).or_default().push(module);
    }

    let page_dirs: BTreeSet<PathBuf> = by_dir.keys().cloned().collect();

    by_dir
        .into_iter()
        .map(|(dir, mut modules)| {
            modules.sort_by(|a, b| a.file_name.cmp(&b.file_name));
            let packages: Vec<&PathBuf> = page_dirs
                .iter()
                .filter(|d| d.parent() == Some(dir.as_path()))
                .collect();
            let stem = page_stem(&dir);
            Page {
                file_name: format!("{}.{}", stem, extension),
                title: display_dir(&dir),
                markdown: page_markdown(&dir, &modules, &packages, extension),
            }
        })
        .collect()
}

fn page_markdown(
    dir: &Path,
    modules: &[ModulePage],
    packages: &[&PathBuf],
    extension: &str,
) -> String {
    let mut out = format!("# {}\n\n", escape_name(&display_dir(dir)));

    let (init, others): (Vec<&ModulePage>, Vec<&ModulePage>) =
        modules.iter().partition(|m| m.file_name == PACKAGE_INIT);

    for module in init {
        let body = module.rendered.body();
        if !body.is_empty() {
            out.push_str(&body);
            out.push('\n');
        }
    }

    if !packages.is_empty() {
        out.push_str("## Packages\n\n");
        for package in packages {
            let name = package
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            out.push_str(&format!(
                "* [{}]({}.{})\n",
                escape_name(&name),
                page_stem(package),
                extension
            ));
        }
        out.push('\n');
    }

    if !others.is_empty() {
        out.push_str("## Modules\n\n");
        for module in &others {
            out.push_str(&format!(
                "* [{}](#{})\n",
                escape_name(&module.file_name),
                module.file_name
            ));
        }
        out.push('\n');
    }

    for module in others {
        out.push_str(&module.rendered.to_string());
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doctree::DocTree;
    use crate::filter::{filter_tree, FilterOptions};
    use crate::render::{render_markdown, RenderOptions};
    use crate::scanner::{ScanOptions, SourceUnit};

    fn module(dir: &str, file: &str, text: &str) -> ModulePage {
        let tree = DocTree::from_source(&SourceUnit::new(file, text), &ScanOptions::default());
        let tree = filter_tree(tree, &FilterOptions::default());
        let options = RenderOptions {
            anchor: true,
            ..Default::default()
        };
        ModulePage {
            rel_dir: PathBuf::from(dir),
            file_name: file.to_string(),
            rendered: render_markdown(&tree, &options),
        }
    }

    #[test]
    fn test_page_stem() {
        assert_eq!(page_stem(Path::new("pkg")), "pkg");
        assert_eq!(page_stem(Path::new("pkg/sub/deep")), "pkg_sub_deep");
    }

    #[test]
    fn test_package_page_layout() {
        let modules = vec![
            module("pkg", "util.py", "\"\"\"Utilities.\"\"\"\n"),
            module("pkg/sub", "leaf.py", "\"\"\"Leaf.\"\"\"\n"),
            module("pkg", "__init__.py", "\"\"\"The package.\"\"\"\n"),
            module("pkg", "core.py", "def run():\n    \"\"\"Run it.\"\"\"\n"),
        ];
        let pages = assemble_pages(modules, "html");

        let names: Vec<_> = pages.iter().map(|p| p.file_name.as_str()).collect();
        assert_eq!(names, ["pkg.html", "pkg_sub.html"]);

        let page = &pages[0].markdown;
        assert!(page.starts_with("# pkg\n\nThe package.\n"));
        assert!(page.contains("## Packages\n\n* [sub](pkg_sub.html)\n"));
        assert!(page.contains("## Modules\n\n* [core.py](#core.py)\n* [util.py](#util.py)\n"));
        assert!(!page.contains("(#\\_\\_init\\_\\_.py)"));

        let core = page.find("## <a id=\"core.py\"></a>core.py").unwrap();
        let util = page.find("## <a id=\"util.py\"></a>util.py").unwrap();
        assert!(core < util);

        assert_eq!(pages[1].title, "pkg/sub");
        assert!(pages[1].markdown.starts_with("# pkg/sub\n\n## Modules\n"));
    }

    #[test]
    fn test_assembly_is_order_independent() {
        let a = vec![
            module("pkg", "b.py", "\"\"\"B.\"\"\"\n"),
            module("pkg", "a.py", "\"\"\"A.\"\"\"\n"),
        ];
        let b = vec![
            module("pkg", "a.py", "\"\"\"A.\"\"\"\n"),
            module("pkg", "b.py", "\"\"\"B.\"\"\"\n"),
        ];
        assert_eq!(assemble_pages(a, "md"), assemble_pages(b, "md"));
    }

    #[test]
    fn test_underscored_names_are_escaped_in_links() {
        let pages = assemble_pages(vec![module("my_pkg", "io_utils.py", "\"\"\"IO.\"\"\"\n")], "md");
        assert_eq!(pages[0].file_name, "my_pkg.md");
        assert!(pages[0].markdown.starts_with("# my\\_pkg\n"));
        assert!(pages[0].markdown.contains("* [io\\_utils.py](#io_utils.py)"));
    }
}
