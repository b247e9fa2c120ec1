//! The single producer: turns a file list or a directory walk into filenames
//! in the bounded buffer, then marks the scan complete.

use ignore::WalkBuilder;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use crate::buffer::BoundedBuffer;
use crate::config::IndexConfig;
use crate::errors::{IndexError, IndexResult};
use crate::filters::FileFilter;
use crate::metrics::IndexMetrics;

/// One item produced by a [`FileSource`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEntry {
    /// A filename to index
    File(String),
    /// An entry that cannot be used, with the reason
    Skipped(String),
}

/// Where the scanner gets its filenames from
#[derive(Debug)]
pub enum FileSource {
    /// An already opened file list, one filename per line
    List { path: PathBuf, file: File },
    /// A directory tree, walked honouring `.gitignore` and the filter
    Walk { root: PathBuf, filter: FileFilter },
}

impl FileSource {
    /// Opens the source named by `config`.
    ///
    /// The file list is opened here, on the calling thread, so an unreadable
    /// list is a startup error rather than a silent empty scan.
    pub fn open(config: &IndexConfig) -> IndexResult<Self> {
        match (&config.file_list, &config.root_path) {
            (Some(path), None) => {
                let file = File::open(path).map_err(|e| IndexError::file_list(path, e))?;
                Ok(Self::List {
                    path: path.clone(),
                    file,
                })
            }
            (None, Some(root)) => Ok(Self::Walk {
                root: root.clone(),
                filter: FileFilter::new(config.file_extensions.clone(), &config.ignore_patterns),
            }),
            _ => Err(IndexError::config_error(
                "specify exactly one of a file list or a root directory",
            )),
        }
    }

    /// Lazily enumerates the source.
    ///
    /// `Err` items are unrecoverable read failures that end the scan.
    pub fn entries(self) -> Box<dyn Iterator<Item = io::Result<ScanEntry>>> {
        match self {
            Self::List { path, file } => {
                debug!("Scanning file list {}", path.display());
                Box::new(list_entries(BufReader::new(file)))
            }
            Self::Walk { root, filter } => {
                debug!("Walking {}", root.display());
                let walker = WalkBuilder::new(&root)
                    .hidden(true)
                    .ignore(true)
                    .git_ignore(true)
                    .git_exclude(true)
                    .build();
                Box::new(walker.filter_map(move |entry| match entry {
                    Ok(entry) => {
                        if !entry.file_type().is_some_and(|ft| ft.is_file())
                            || !filter.allows(entry.path())
                        {
                            return None;
                        }
                        Some(Ok(match entry.path().to_str() {
                            Some(name) => ScanEntry::File(name.to_string()),
                            None => ScanEntry::Skipped(format!(
                                "path is not valid UTF-8: {}",
                                entry.path().display()
                            )),
                        }))
                    }
                    Err(e) => Some(Ok(ScanEntry::Skipped(e.to_string()))),
                }))
            }
        }
    }
}

/// Reads filenames from `reader`, one per line.
///
/// Undecodable lines are skipped; any other read error ends the list.
pub fn list_entries<R: BufRead>(reader: R) -> impl Iterator<Item = io::Result<ScanEntry>> {
    reader
        .lines()
        .enumerate()
        .map(|(i, line)| match line {
            Ok(line) => Ok(ScanEntry::File(line)),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => Ok(ScanEntry::Skipped(format!(
                "file list line {} is not valid UTF-8",
                i + 1
            ))),
            Err(e) => Err(e),
        })
}

/// Marks the scan complete when dropped, so the indexers are released even if
/// the scanner unwinds.
struct ScanCompletion<'a>(&'a BoundedBuffer);

impl Drop for ScanCompletion<'_> {
    fn drop(&mut self) {
        self.0.mark_scan_complete();
    }
}

/// Pushes every usable entry into `buffer`, then marks the scan complete.
///
/// Returns the number of filenames queued.
pub fn run_scanner<I>(entries: I, buffer: &BoundedBuffer, metrics: &IndexMetrics) -> usize
where
    I: IntoIterator<Item = io::Result<ScanEntry>>,
{
    let _completion = ScanCompletion(buffer);
    let mut queued = 0;

    for entry in entries {
        match entry {
            Ok(ScanEntry::File(name)) if name.trim().is_empty() => {
                metrics.record_skipped();
            }
            Ok(ScanEntry::File(name)) => {
                debug!("Queueing {}", name);
                if buffer.put(name).is_err() {
                    error!("Bounded buffer closed while the scanner was still running");
                    break;
                }
                metrics.record_scanned();
                queued += 1;
            }
            Ok(ScanEntry::Skipped(reason)) => {
                warn!("Skipping entry: {}", reason);
                metrics.record_skipped();
            }
            Err(e) => {
                error!("Stopping scan after read error: {}", e);
                break;
            }
        }
    }

    info!("Scan complete: {} files queued", queued);
    queued
}
