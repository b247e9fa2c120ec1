use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::errors::{IndexError, IndexResult};

/// Capacity of the scanner -> indexer buffer when none is configured
pub const DEFAULT_BUFFER_CAPACITY: usize = 32;

/// How to treat bytes that are not valid UTF-8 while indexing a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingMode {
    /// Fail the whole file at the first invalid line
    FailFast,
    /// Replace invalid sequences with U+FFFD and keep going
    #[default]
    Lossy,
}

/// Configuration for one indexing run.
///
/// # Configuration Locations
///
/// Values are merged from, lowest precedence first:
/// 1. Global `$CONFIG_DIR/wordscout/config.yaml`
/// 2. Local `.wordscout.yaml` in the current directory
/// 3. A file passed with `--config`
///
/// Command-line arguments are merged on top with [`IndexConfig::merge_with_cli`].
///
/// # Configuration Format
///
/// ```yaml
/// # Number of indexer threads (default: CPU cores)
/// thread_count: 4
///
/// # Capacity of the scanner -> indexer buffer
/// buffer_capacity: 32
///
/// # Either a file listing one path per line...
/// file_list: "files.txt"
/// # ...or a directory to walk
/// # root_path: "src"
///
/// file_extensions: ["rs", "txt"]
/// ignore_patterns: ["target/**", "**/*.tmp"]
///
/// # failfast | lossy
/// encoding_mode: lossy
///
/// log_level: "info"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Number of indexer threads in the pool
    #[serde(default = "default_thread_count")]
    pub thread_count: NonZeroUsize,

    /// Maximum number of filenames queued between scanner and indexers
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: NonZeroUsize,

    /// File listing the files to index, one per line
    #[serde(default)]
    pub file_list: Option<PathBuf>,

    /// Directory to walk for files to index
    #[serde(default)]
    pub root_path: Option<PathBuf>,

    /// Only index files with these extensions (directory walks only)
    #[serde(default)]
    pub file_extensions: Option<Vec<String>>,

    /// Glob patterns excluded from directory walks
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    #[serde(default)]
    pub encoding_mode: EncodingMode,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_buffer_capacity() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_BUFFER_CAPACITY).unwrap_or(NonZeroUsize::MIN)
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            thread_count: default_thread_count(),
            buffer_capacity: default_buffer_capacity(),
            file_list: None,
            root_path: None,
            file_extensions: None,
            ignore_patterns: Vec::new(),
            encoding_mode: EncodingMode::default(),
            log_level: default_log_level(),
        }
    }
}

impl IndexConfig {
    /// Config reading `file_list` with `threads` indexers and defaults elsewhere
    pub fn for_file_list(file_list: impl Into<PathBuf>, threads: NonZeroUsize) -> Self {
        Self {
            thread_count: threads,
            file_list: Some(file_list.into()),
            ..Self::default()
        }
    }

    /// Config walking `root` with `threads` indexers and defaults elsewhere
    pub fn for_root(root: impl Into<PathBuf>, threads: NonZeroUsize) -> Self {
        Self {
            thread_count: threads,
            root_path: Some(root.into()),
            ..Self::default()
        }
    }

    /// Loads configuration from the default locations plus `config_path`
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let config_files = [
            dirs::config_dir().map(|p| p.join("wordscout/config.yaml")),
            Some(PathBuf::from(".wordscout.yaml")),
        ];
        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }
        // An explicit path must exist.
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path));
        }

        builder.build()?.try_deserialize()
    }

    /// Merges CLI arguments over configuration file values.
    ///
    /// `cli` holds only what was given on the command line; `None` leaves the
    /// file value in place.
    pub fn merge_with_cli(mut self, cli: CliOverrides) -> Self {
        if let Some(threads) = cli.thread_count {
            self.thread_count = threads;
        }
        if let Some(capacity) = cli.buffer_capacity {
            self.buffer_capacity = capacity;
        }
        if cli.file_list.is_some() || cli.root_path.is_some() {
            self.file_list = cli.file_list;
            self.root_path = cli.root_path;
        }
        if cli.file_extensions.is_some() {
            self.file_extensions = cli.file_extensions;
        }
        if !cli.ignore_patterns.is_empty() {
            self.ignore_patterns = cli.ignore_patterns;
        }
        if let Some(mode) = cli.encoding_mode {
            self.encoding_mode = mode;
        }
        if let Some(level) = cli.log_level {
            self.log_level = level;
        }
        self
    }

    /// Checks everything that must hold before any thread is started
    pub fn validate(&self) -> IndexResult<()> {
        match (&self.file_list, &self.root_path) {
            (Some(_), Some(_)) => Err(IndexError::config_error(
                "specify either a file list or a root directory, not both",
            )),
            (None, None) => Err(IndexError::config_error(
                "no input: specify a file list or a root directory",
            )),
            (Some(list), None) => std::fs::File::open(list)
                .map(|_| ())
                .map_err(|e| IndexError::file_list(list, e)),
            (None, Some(root)) if !root.is_dir() => Err(IndexError::config_error(format!(
                "root path {} is not a directory",
                root.display()
            ))),
            (None, Some(_)) => Ok(()),
        }
    }

    /// Effective configuration rendered as YAML
    pub fn to_yaml(&self) -> IndexResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Values supplied on the command line, each optional
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub thread_count: Option<NonZeroUsize>,
    pub buffer_capacity: Option<NonZeroUsize>,
    pub file_list: Option<PathBuf>,
    pub root_path: Option<PathBuf>,
    pub file_extensions: Option<Vec<String>>,
    pub ignore_patterns: Vec<String>,
    pub encoding_mode: Option<EncodingMode>,
    pub log_level: Option<String>,
}

/// Parses a raw thread count, rejecting zero
pub fn parse_thread_count(raw: usize) -> IndexResult<NonZeroUsize> {
    NonZeroUsize::new(raw).ok_or(IndexError::InvalidThreadCount)
}

/// Parses a raw buffer capacity, rejecting zero
pub fn parse_buffer_capacity(raw: usize) -> IndexResult<NonZeroUsize> {
    NonZeroUsize::new(raw).ok_or(IndexError::InvalidBufferCapacity)
}
