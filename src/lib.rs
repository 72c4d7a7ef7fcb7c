//! docpy - Generate API documentation from Python sources without importing them.
//!
//! docpy scans Python files with a lightweight structural scanner, keeps
//! the public, documented classes, methods and functions, and renders them
//! as Markdown or HTML. Point it at a package directory and it writes one
//! page per package.
//!
//! # Quick Start
//!
//! ```no_run
//! use docpy::builder::Docpy;
//! use docpy::output::OutputFormat;
//!
//! // Document a single module as Markdown
//! let text = Docpy::new("shapes.py")
//!     .format(OutputFormat::Markdown)
//!     .module_text()
//!     .unwrap();
//! print!("{}", text);
//!
//! // Write HTML pages for a whole package into `shapes_docs/`
//! let (docs, written) = Docpy::new("shapes").write_package().unwrap();
//! println!("{} pages, {} modules skipped", written.len(), docs.skipped.len());
//! ```
//!
//! # Modules
//!
//! - [`scanner`] - Logical lines, signatures, docstrings and `__all__`
//! - [`doctree`] - Module → class → method tree
//! - [`filter`] - Visibility rules and docstring gating
//! - [`render`] - Markdown rendering with underscore escaping
//! - [`output`] - HTML pages and JSON
//! - [`walker`] - Package traversal with gitignore support
//! - [`package`] - Per-directory page assembly
//! - [`builder`] - Fluent API tying it together

pub mod scanner;
pub mod doctree;
pub mod filter;
pub mod render;
pub mod errors;
pub mod walker;
pub mod package;
pub mod output;
pub mod builder;

// Re-export key types at crate root for convenience
pub use builder::{Docpy, DocumentedModule, PackageDocs};
pub use doctree::{DocNode, DocTree};
pub use errors::DocpyError;
pub use filter::{filter_tree, FilterOptions};
pub use output::{OutputError, OutputFormat};
pub use render::{render_markdown, RenderOptions, RenderedDoc};
pub use scanner::{Declaration, DeclarationKind, Parameter, ParameterKind, ScanOptions, SourceUnit};
pub use walker::WalkError;
