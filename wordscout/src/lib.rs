pub mod buffer;
pub mod config;
pub mod errors;
pub mod filters;
pub mod index;
pub mod indexer;
pub mod metrics;
pub mod pipeline;
pub mod registry;
pub mod scanner;
pub mod search;
pub mod sync;
pub mod tokenizer;

pub use buffer::BoundedBuffer;
pub use config::{CliOverrides, EncodingMode, IndexConfig};
pub use errors::{IndexError, IndexResult};
pub use index::{Occurrence, WordIndex};
pub use metrics::{IndexMetrics, IndexStats};
pub use pipeline::{IndexingPipeline, PipelineHandle};
pub use registry::{FileStatus, IndexedFileRegistry, WaitOutcome};
pub use search::{OutputFormat, Query, SearchOutcome, Searcher};
pub use sync::RwLock;
