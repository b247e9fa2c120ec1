//! Thread orchestration: one scanner, a pool of indexers and a collector.
//!
//! ```text
//! file list / walk -> scanner -> BoundedBuffer -> indexer x N -> WordIndex
//!                                                      |
//!                                                      +-> IndexedFileRegistry
//! collector: joins every indexer, then marks indexing complete
//! ```
//!
//! Each indexer leaves on its own once the buffer reports no more work. No
//! single indexer knows when the whole pool is done; the collector does, and
//! that is what releases advanced searches waiting on a file that never
//! shows up.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{error, info};

use crate::buffer::BoundedBuffer;
use crate::config::{EncodingMode, IndexConfig};
use crate::errors::{IndexError, IndexResult};
use crate::index::WordIndex;
use crate::indexer::Indexer;
use crate::metrics::{IndexMetrics, IndexStats};
use crate::registry::IndexedFileRegistry;
use crate::scanner::{run_scanner, FileSource, ScanEntry};
use crate::search::Searcher;

/// State every pipeline thread holds a reference to
#[derive(Debug)]
pub struct SharedState {
    pub buffer: BoundedBuffer,
    pub index: WordIndex,
    pub registry: IndexedFileRegistry,
    pub metrics: IndexMetrics,
    encoding_mode: EncodingMode,
}

impl SharedState {
    fn new(config: &IndexConfig) -> Self {
        Self {
            buffer: BoundedBuffer::new(config.buffer_capacity),
            index: WordIndex::new(),
            registry: IndexedFileRegistry::new(),
            metrics: IndexMetrics::new(),
            encoding_mode: config.encoding_mode,
        }
    }

    fn indexer(&self) -> Indexer<'_> {
        Indexer {
            buffer: &self.buffer,
            index: &self.index,
            registry: &self.registry,
            metrics: &self.metrics,
            encoding_mode: self.encoding_mode,
        }
    }
}

/// Starts indexing runs
pub struct IndexingPipeline;

impl IndexingPipeline {
    /// Validates `config`, opens its file source and starts every thread.
    ///
    /// Returns as soon as the threads are running; searches can be issued
    /// through the handle while indexing is still in progress.
    pub fn start(config: &IndexConfig) -> IndexResult<PipelineHandle> {
        config.validate()?;
        let source = FileSource::open(config)?;
        Self::launch(config, move || source.entries())
    }

    /// Starts the pipeline over an explicit sequence of scan entries
    pub fn start_with_entries<I>(config: &IndexConfig, entries: I) -> IndexResult<PipelineHandle>
    where
        I: IntoIterator<Item = io::Result<ScanEntry>> + Send + 'static,
    {
        Self::launch(config, move || entries)
    }

    fn launch<S, I>(config: &IndexConfig, source: S) -> IndexResult<PipelineHandle>
    where
        S: FnOnce() -> I + Send + 'static,
        I: IntoIterator<Item = io::Result<ScanEntry>>,
    {
        let state = Arc::new(SharedState::new(config));
        let workers = config.thread_count.get();
        info!(
            "Starting pipeline: {} indexer(s), buffer capacity {}",
            workers,
            state.buffer.capacity()
        );

        let mut indexers = Vec::with_capacity(workers);
        let mut last_spawn_error = None;
        for worker in 0..workers {
            let shared = Arc::clone(&state);
            let spawned = thread::Builder::new()
                .name(format!("wordscout-indexer-{}", worker))
                .spawn(move || shared.indexer().run(worker));
            match spawned {
                Ok(handle) => indexers.push(handle),
                Err(e) => {
                    error!("Failed to create indexer thread #{}: {}", worker, e);
                    last_spawn_error = Some(e);
                }
            }
        }
        if indexers.is_empty() {
            let source = last_spawn_error.unwrap_or_else(|| io::Error::other("no indexers"));
            return Err(abort_startup(&state, IndexError::thread_spawn("indexer", source)));
        }
        let spawned = indexers.len();

        let shared = Arc::clone(&state);
        let collector = thread::Builder::new()
            .name("wordscout-collector".to_string())
            .spawn(move || collect(indexers, &shared.registry))
            .map_err(|e| abort_startup(&state, IndexError::thread_spawn("collector", e)))?;

        let shared = Arc::clone(&state);
        let scanner = thread::Builder::new()
            .name("wordscout-scanner".to_string())
            .spawn(move || run_scanner(source(), &shared.buffer, &shared.metrics))
            .map_err(|e| abort_startup(&state, IndexError::thread_spawn("scanner", e)))?;

        Ok(PipelineHandle {
            state,
            scanner: Some(scanner),
            collector: Some(collector),
            workers: spawned,
        })
    }
}

/// Releases any thread already started so it exits on its own, then hands
/// back `err`.
fn abort_startup(state: &SharedState, err: IndexError) -> IndexError {
    error!("Pipeline startup failed: {}", err);
    state.buffer.mark_scan_complete();
    err
}

/// Collector body: wait for the whole pool, then announce completion
fn collect(indexers: Vec<JoinHandle<usize>>, registry: &IndexedFileRegistry) -> usize {
    let mut indexed = 0;
    for (worker, handle) in indexers.into_iter().enumerate() {
        match handle.join() {
            Ok(count) => indexed += count,
            Err(_) => error!("Indexer thread #{} panicked", worker),
        }
    }
    registry.mark_indexing_complete();
    indexed
}

/// A running pipeline
#[derive(Debug)]
pub struct PipelineHandle {
    state: Arc<SharedState>,
    scanner: Option<JoinHandle<usize>>,
    collector: Option<JoinHandle<usize>>,
    workers: usize,
}

impl PipelineHandle {
    pub fn index(&self) -> &WordIndex {
        &self.state.index
    }

    pub fn registry(&self) -> &IndexedFileRegistry {
        &self.state.registry
    }

    pub fn metrics(&self) -> &IndexMetrics {
        &self.state.metrics
    }

    /// Number of indexer threads actually running
    pub fn worker_count(&self) -> usize {
        self.workers
    }

    /// A search front end reading this pipeline's index and registry
    pub fn searcher(&self) -> Searcher<'_> {
        Searcher::new(&self.state.index, &self.state.registry)
    }

    pub fn is_complete(&self) -> bool {
        self.state.registry.is_indexing_complete()
    }

    /// Joins the scanner and the collector and returns the final counters
    pub fn wait(mut self) -> IndexResult<IndexStats> {
        if let Some(scanner) = self.scanner.take() {
            scanner
                .join()
                .map_err(|_| IndexError::thread_panicked("scanner"))?;
        }
        if let Some(collector) = self.collector.take() {
            let indexed = collector
                .join()
                .map_err(|_| IndexError::thread_panicked("collector"))?;
            info!("Collector joined {} indexer(s), {} files indexed", self.workers, indexed);
        }
        self.state.metrics.log_stats();
        Ok(self.state.metrics.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FileStatus;
    use std::fs;
    use std::num::NonZeroUsize;
    use tempfile::tempdir;

    fn entries(names: &[String]) -> Vec<io::Result<ScanEntry>> {
        names.iter().map(|n| Ok(ScanEntry::File(n.clone()))).collect()
    }

    #[test]
    fn test_pipeline_indexes_everything_and_completes() {
        let dir = tempdir().unwrap();
        let mut names = Vec::new();
        for i in 0..20 {
            let path = dir.path().join(format!("f{}.txt", i));
            fs::write(&path, format!("common word{}\nsecond line", i)).unwrap();
            names.push(path.to_str().unwrap().to_string());
        }

        let config = IndexConfig {
            thread_count: NonZeroUsize::new(4).unwrap(),
            buffer_capacity: NonZeroUsize::new(2).unwrap(),
            ..IndexConfig::default()
        };

        let handle = IndexingPipeline::start_with_entries(&config, entries(&names)).unwrap();
        assert_eq!(handle.worker_count(), 4);

        // The last file queued is visible as soon as it is announced.
        assert_eq!(
            handle.registry().wait_for_file(&names[19]),
            FileStatus::Indexed
        );
        assert_eq!(
            handle.index().lookup_in_file("word19", &names[19]).len(),
            1
        );

        // A file that is not in the input is only answered once the pool is done.
        assert_eq!(
            handle.registry().wait_for_file("not-in-input.txt"),
            FileStatus::NeverIndexed
        );
        assert!(handle.is_complete());
        assert_eq!(handle.index().lookup("common").unwrap().len(), 20);
        assert_eq!(handle.registry().len(), 20);

        let stats = handle.wait().unwrap();
        assert_eq!(stats.files_scanned, 20);
        assert_eq!(stats.files_indexed, 20);
        assert_eq!(stats.files_failed, 0);
    }

    #[test]
    fn test_empty_input_still_completes() {
        let config = IndexConfig::default();
        let handle = IndexingPipeline::start_with_entries(&config, Vec::new()).unwrap();
        assert_eq!(
            handle.registry().wait_for_file("anything.txt"),
            FileStatus::NeverIndexed
        );
        let stats = handle.wait().unwrap();
        assert_eq!(stats.files_indexed, 0);
    }

    #[test]
    fn test_missing_files_do_not_stop_the_pool() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.txt");
        fs::write(&good, "present").unwrap();
        let names = vec![
            dir.path().join("gone1.txt").to_str().unwrap().to_string(),
            good.to_str().unwrap().to_string(),
            dir.path().join("gone2.txt").to_str().unwrap().to_string(),
        ];

        let config = IndexConfig {
            thread_count: NonZeroUsize::new(2).unwrap(),
            ..IndexConfig::default()
        };
        let handle = IndexingPipeline::start_with_entries(&config, entries(&names)).unwrap();

        assert_eq!(
            handle.registry().wait_for_file(&names[0]),
            FileStatus::NeverIndexed
        );
        assert_eq!(handle.registry().wait_for_file(&names[1]), FileStatus::Indexed);

        let stats = handle.wait().unwrap();
        assert_eq!(stats.files_indexed, 1);
        assert_eq!(stats.files_failed, 2);
    }

    #[test]
    fn test_start_rejects_invalid_config() {
        let config = IndexConfig::default();
        assert!(IndexingPipeline::start(&config).is_err());
    }
}
