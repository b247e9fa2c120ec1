//! Decides which discovered files are handed to the indexer pool when the
//! scanner walks a directory tree instead of reading a file list.
use glob::Pattern;
use std::path::Path;
use tracing::warn;

/// Extensions of files that are never worth tokenizing
const BINARY_EXTENSIONS: &[&str] = &[
    "exe", "dll", "so", "dylib", "bin", "obj", "o", "a", "class", "jar", "war", "png", "jpg",
    "jpeg", "gif", "bmp", "ico", "pdf", "doc", "docx", "xls", "xlsx", "zip", "tar", "gz", "7z",
    "rar", "wasm",
];

/// Extension allow-list plus glob ignore patterns, compiled once per scan
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    extensions: Option<Vec<String>>,
    ignore: Vec<Pattern>,
}

impl FileFilter {
    /// Builds a filter. Invalid glob patterns are logged and dropped.
    pub fn new(extensions: Option<Vec<String>>, ignore_patterns: &[String]) -> Self {
        let ignore = ignore_patterns
            .iter()
            .filter_map(|pattern| match Pattern::new(pattern) {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!("Skipping invalid ignore pattern '{}': {}", pattern, e);
                    None
                }
            })
            .collect();
        Self { extensions, ignore }
    }

    /// Whether `path` should be indexed
    pub fn allows(&self, path: &Path) -> bool {
        !is_likely_binary(path)
            && has_valid_extension(path, &self.extensions)
            && !self.is_ignored(path)
    }

    fn is_ignored(&self, path: &Path) -> bool {
        let normalized = path.to_string_lossy().replace('\\', "/");
        if normalized.contains("/target/") || normalized.contains("/.git/") {
            return true;
        }
        self.ignore.iter().any(|p| p.matches(&normalized))
    }
}

/// Checks the extension against an optional, case-insensitive allow-list
pub fn has_valid_extension(path: &Path, extensions: &Option<Vec<String>>) -> bool {
    let Some(exts) = extensions else {
        return true;
    };
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| exts.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

pub fn is_likely_binary(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| BINARY_EXTENSIONS.iter().any(|b| b.eq_ignore_ascii_case(ext)))
}
