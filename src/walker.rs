//! Package traversal with gitignore support.
//!
//! Uses the `ignore` crate to walk a package directory while respecting
//! .gitignore, .git/info/exclude, global gitignore, and .docpyignore, and
//! collects the Python modules to document.

use std::path::{Path, PathBuf};

use glob::Pattern;
use ignore::WalkBuilder;
use thiserror::Error;

/// Extensions of files treated as Python modules.
pub const MODULE_EXTENSIONS: &[&str] = &["py"];

/// Name of the per-package ignore file.
pub const IGNORE_FILE: &str = ".docpyignore";

/// Errors that can occur during directory walking.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("path not found: {path}")]
    NotFound { path: PathBuf },

    #[error("not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid exclude pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// Options for directory walking.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Maximum depth to recurse (None = unlimited).
    pub max_depth: Option<usize>,
    /// Follow symbolic links.
    pub follow_symlinks: bool,
    /// Include hidden files and directories.
    pub include_hidden: bool,
    /// Respect .gitignore patterns.
    pub respect_gitignore: bool,
    /// Glob patterns matched against paths relative to the root; a matching
    /// directory is not descended into.
    pub exclude: Vec<Pattern>,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            follow_symlinks: false,
            include_hidden: false,
            respect_gitignore: true,
            exclude: Vec::new(),
        }
    }
}

impl WalkOptions {
    /// Create options that include hidden files.
    pub fn with_hidden() -> Self {
        Self {
            include_hidden: true,
            ..Default::default()
        }
    }

    /// Set maximum depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Add exclude patterns, failing on the first invalid one.
    pub fn exclude<I, S>(mut self, patterns: I) -> Result<Self, WalkError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let compiled = Pattern::new(pattern).map_err(|source| WalkError::Pattern {
                pattern: pattern.to_string(),
                source,
            })?;
            self.exclude.push(compiled);
        }
        Ok(self)
    }
}

/// Entry from directory walk.
#[derive(Debug, Clone)]
pub struct WalkEntry {
    /// Path to the entry.
    pub path: PathBuf,
    /// Depth from root (root = 0).
    pub depth: usize,
    /// Whether this is a file or directory.
    pub is_file: bool,
}

impl WalkEntry {
    /// True for files with a Python module extension.
    pub fn is_module(&self) -> bool {
        self.is_file && is_module_path(&self.path)
    }
}

/// True when `path` has a Python module extension.
pub fn is_module_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| MODULE_EXTENSIONS.contains(&ext))
}

fn is_excluded(root: &Path, path: &Path, patterns: &[Pattern]) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    if relative.as_os_str().is_empty() {
        return false;
    }
    let relative = relative.to_string_lossy();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    patterns
        .iter()
        .any(|p| p.matches(&relative) || p.matches(&name))
}

/// Walk a directory tree, yielding entries.
///
/// Respects .gitignore and .docpyignore patterns automatically.
///
/// # Examples
///
/// ```no_run
/// use docpy::walker::{walk, WalkOptions};
/// use std::path::Path;
///
/// for entry in walk(Path::new("mypkg"), &WalkOptions::default()).unwrap().flatten() {
///     println!("{}", entry.path.display());
/// }
/// ```
pub fn walk(
    root: &Path,
    options: &WalkOptions,
) -> Result<impl Iterator<Item = Result<WalkEntry, WalkError>>, WalkError> {
    if !root.exists() {
        return Err(WalkError::NotFound {
            path: root.to_path_buf(),
        });
    }
    if !root.is_dir() {
        return Err(WalkError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let mut builder = WalkBuilder::new(root);

    builder
        .hidden(!options.include_hidden)
        .git_ignore(options.respect_gitignore)
        .git_global(options.respect_gitignore)
        .git_exclude(options.respect_gitignore)
        .follow_links(options.follow_symlinks)
        .max_depth(options.max_depth);

    let ignore_file = root.join(IGNORE_FILE);
    if ignore_file.exists() {
        builder.add_ignore(&ignore_file);
    }

    if !options.exclude.is_empty() {
        let patterns = options.exclude.clone();
        let base = root.to_path_buf();
        builder.filter_entry(move |entry| !is_excluded(&base, entry.path(), &patterns));
    }

    let iter = builder.build().filter_map(|result| match result {
        Ok(entry) => Some(Ok(WalkEntry {
            is_file: entry.file_type().is_some_and(|ft| ft.is_file()),
            depth: entry.depth(),
            path: entry.into_path(),
        })),
        Err(ignore::Error::Io(source)) => {
            let path = PathBuf::from("<walk error>");
            if source.kind() == std::io::ErrorKind::PermissionDenied {
                Some(Err(WalkError::PermissionDenied { path }))
            } else {
                Some(Err(WalkError::Io { path, source }))
            }
        }
        Err(ignore::Error::WithPath { path, err }) => match *err {
            ignore::Error::Io(source) if source.kind() == std::io::ErrorKind::PermissionDenied => {
                Some(Err(WalkError::PermissionDenied { path }))
            }
            ignore::Error::Io(source) => Some(Err(WalkError::Io { path, source })),
            _ => None,
        },
        // Skip non-IO errors (like gitignore parse errors)
        Err(_) => None,
    });

    Ok(iter)
}

/// Collect every Python module under `root`, sorted by path.
///
/// Unreadable directory entries are logged and skipped.
pub fn collect_modules(root: &Path, options: &WalkOptions) -> Result<Vec<PathBuf>, WalkError> {
    let mut modules: Vec<PathBuf> = walk(root, options)?
        .filter_map(|entry| match entry {
            Ok(entry) => entry.is_module().then_some(entry.path),
            Err(e) => {
                log::warn!("skipping entry: {}", e);
                None
            }
        })
        .collect();
    modules.sort();
    Ok(modules)
}
