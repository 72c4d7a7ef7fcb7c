//! Fluent builder API for docpy.
//!
//! Provides both function composition and builder-style APIs for
//! documenting a single module or a whole package.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use rayon::prelude::*;

use crate::doctree::DocTree;
use crate::errors::DocpyError;
use crate::filter::{filter_tree, FilterOptions};
use crate::output::{format_page, module_json, modules_json, OutputFormat};
use crate::package::{assemble_pages, ModulePage, Page};
use crate::render::{render_markdown, RenderOptions, RenderedDoc};
use crate::scanner::{ScanOptions, SourceUnit};
use crate::walker::{collect_modules, WalkOptions};

/// Builder for documenting a Python module or package.
///
/// # Examples
///
/// ```no_run
/// use docpy::builder::Docpy;
/// use docpy::output::OutputFormat;
///
/// let text = Docpy::new("mymodule.py")
///     .format(OutputFormat::Markdown)
///     .document_all(true)
///     .module_text()
///     .unwrap();
/// print!("{}", text);
/// ```
#[derive(Debug, Clone)]
pub struct Docpy {
    root: PathBuf,
    format: OutputFormat,
    scan_options: ScanOptions,
    filter_options: FilterOptions,
    walk_options: WalkOptions,
    output_dir: Option<PathBuf>,
}

impl Docpy {
    /// Create a new builder for a module file or package directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            format: OutputFormat::default(),
            scan_options: ScanOptions::default(),
            filter_options: FilterOptions::default(),
            walk_options: WalkOptions::default(),
            output_dir: None,
        }
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Document objects without a docstring too.
    pub fn document_all(mut self, all: bool) -> Self {
        self.filter_options.ignore_undocumented = !all;
        self
    }

    /// Column width a tab advances indentation to.
    pub fn tab_width(mut self, width: usize) -> Self {
        self.scan_options.tab_width = width.max(1);
        self
    }

    /// Replace the walk options used in package mode.
    pub fn walk_options(mut self, options: WalkOptions) -> Self {
        self.walk_options = options;
        self
    }

    /// Include hidden files.
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.walk_options.include_hidden = include;
        self
    }

    /// Directory package pages are written to (default `<package>_docs`).
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    fn render_options(&self, anchor: bool) -> RenderOptions {
        RenderOptions {
            anchor,
            escape_html: self.format == OutputFormat::Html,
        }
    }

    /// True when a module has anything to show under the current gating.
    fn is_reported(&self, tree: &DocTree) -> bool {
        tree.has_content() || !self.filter_options.ignore_undocumented
    }

    /// Document the root as a single module.
    pub fn module(&self) -> Result<DocumentedModule, DocpyError> {
        let unit = read_source(&self.root)?;
        let (tree, rendered) = document_source(
            &unit,
            &self.scan_options,
            &self.filter_options,
            &self.render_options(false),
        );
        Ok(DocumentedModule {
            path: self.root.clone(),
            tree,
            rendered,
        })
    }

    /// Document the root as a single module, formatted for output.
    ///
    /// A module with nothing to document yields an empty string, except in
    /// JSON, which always describes the module.
    pub fn module_text(&self) -> Result<String, DocpyError> {
        let module = self.module()?;
        if self.format == OutputFormat::Json {
            return Ok(module_json(&module.tree)?);
        }
        if !self.is_reported(&module.tree) {
            return Ok(String::new());
        }
        let title = self.root.display().to_string();
        Ok(format_page(&title, &module.rendered.to_markdown(), self.format))
    }

    /// Document every module of the root package.
    ///
    /// Modules are documented in parallel. An unreadable module is logged
    /// and recorded in [`PackageDocs::skipped`]; the run continues.
    pub fn package(&self) -> Result<PackageDocs, DocpyError> {
        let root = package_root(&self.root)?;
        let name = package_name(&root);

        let paths = collect_modules(&root, &self.walk_options)?;
        if paths.is_empty() {
            return Err(DocpyError::NoModulesFound(self.root.clone()));
        }

        let options = self.render_options(true);
        let results: Vec<(PathBuf, Result<DocumentedModule, DocpyError>)> = paths
            .into_par_iter()
            .map(|path| {
                info!("documenting {}", path.display());
                let result = read_source(&path).map(|unit| {
                    let (tree, rendered) =
                        document_source(&unit, &self.scan_options, &self.filter_options, &options);
                    DocumentedModule {
                        path: path.clone(),
                        tree,
                        rendered,
                    }
                });
                (path, result)
            })
            .collect();

        let mut modules = Vec::with_capacity(results.len());
        let mut skipped = Vec::new();
        for (path, result) in results {
            match result {
                Ok(module) => modules.push(module),
                Err(e) => {
                    warn!("skipping {}: {}", path.display(), e);
                    skipped.push(path);
                }
            }
        }

        let pages: Vec<ModulePage> = modules
            .iter()
            .filter(|m| self.is_reported(&m.tree))
            .map(|m| ModulePage {
                rel_dir: relative_dir(&root, &name, &m.path),
                file_name: m.tree.file_name.clone(),
                rendered: m.rendered.clone(),
            })
            .collect();
        let pages = assemble_pages(pages, self.format.extension());

        Ok(PackageDocs {
            name,
            modules,
            pages,
            skipped,
        })
    }

    /// Document the root package and write its pages.
    ///
    /// Returns the package documentation and the paths written.
    pub fn write_package(&self) -> Result<(PackageDocs, Vec<PathBuf>), DocpyError> {
        let docs = self.package()?;
        let out_dir = self
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}_docs", docs.name)));

        fs::create_dir_all(&out_dir).map_err(|source| DocpyError::Write {
            path: out_dir.clone(),
            source,
        })?;

        let mut written = Vec::with_capacity(docs.pages.len());
        for page in &docs.pages {
            let path = out_dir.join(&page.file_name);
            let content = format_page(&page.title, &page.markdown, self.format);
            fs::write(&path, content).map_err(|source| DocpyError::Write {
                path: path.clone(),
                source,
            })?;
            info!("wrote {}", path.display());
            written.push(path);
        }

        Ok((docs, written))
    }

    /// Document the root package as a single JSON document.
    pub fn package_json(&self) -> Result<String, DocpyError> {
        let docs = self.package()?;
        Ok(modules_json(docs.modules.iter().map(|m| &m.tree))?)
    }
}

/// A module read from disk, filtered and rendered.
#[derive(Debug, Clone)]
pub struct DocumentedModule {
    pub path: PathBuf,
    pub tree: DocTree,
    pub rendered: RenderedDoc,
}

/// Result of documenting a package.
#[derive(Debug)]
pub struct PackageDocs {
    /// Name of the root package directory.
    pub name: String,
    /// Every module that could be read, sorted by path.
    pub modules: Vec<DocumentedModule>,
    /// Assembled pages, sorted by directory.
    pub pages: Vec<Page>,
    /// Modules that could not be read.
    pub skipped: Vec<PathBuf>,
}

fn package_root(root: &Path) -> Result<PathBuf, DocpyError> {
    fs::canonicalize(root).map_err(|e| DocpyError::read(root, e))
}

fn package_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "package".to_string())
}

/// Directory of `module` relative to the package's parent, e.g. `pkg/sub`.
fn relative_dir(root: &Path, name: &str, module: &Path) -> PathBuf {
    let dir = module.parent().unwrap_or(root);
    let inner = dir.strip_prefix(root).unwrap_or(Path::new(""));
    Path::new(name).join(inner)
}

// ============================================================================
// Functional API
// ============================================================================

/// Read a module from disk.
///
/// Missing files, permission problems and invalid UTF-8 are errors.
pub fn read_source(path: &Path) -> Result<SourceUnit, DocpyError> {
    let text = fs::read_to_string(path).map_err(|e| DocpyError::read(path, e))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(SourceUnit::new(file_name, text))
}

/// Scan, filter and render one source unit.
pub fn document_source(
    unit: &SourceUnit,
    scan: &ScanOptions,
    filter: &FilterOptions,
    render: &RenderOptions,
) -> (DocTree, RenderedDoc) {
    let tree = filter_tree(DocTree::from_source(unit, scan), filter);
    let rendered = render_markdown(&tree, render);
    (tree, rendered)
}

/// Markdown for a module's text with default options.
///
/// # Examples
///
/// ```
/// use docpy::builder::markdown_for;
///
/// let md = markdown_for("shapes.py", "def area(r):\n    \"\"\"Area of a circle.\"\"\"\n");
/// assert!(md.contains("#### shapes.**area**(_r_)"));
/// ```
pub fn markdown_for(file_name: &str, text: &str) -> String {
    let unit = SourceUnit::new(file_name, text);
    let (_, rendered) = document_source(
        &unit,
        &ScanOptions::default(),
        &FilterOptions::default(),
        &RenderOptions::default(),
    );
    rendered.to_markdown()
}
