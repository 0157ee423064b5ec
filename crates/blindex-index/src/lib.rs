//! Write, query and backfill paths of the blind search index.
//!
//! ## Key Components
//!
//! - [`IndexWriter`]: replaces a document's entries with the hashes of its
//!   current text, or removes them when the document is deleted
//! - [`QueryPlanner`]: hashes query text and returns candidate documents
//! - [`BackfillCoordinator`]: batch job that indexes documents missing
//!   entries, or holding entries from an older key
//! - [`DocumentSource`]: what the external document store must provide
//!
//! ## Example
//!
//! ```ignore
//! use blindex_index::{IndexWriter, QueryPlanner};
//!
//! let writer = IndexWriter::new(storage.clone(), pipeline.clone());
//! writer.reindex(tenant, document, "Die Kündigungsfrist beträgt drei Monate")?;
//!
//! let planner = QueryPlanner::new(storage, pipeline);
//! let candidates = planner.search(tenant, "kündigungsfrist", Some(20))?;
//! ```

pub mod backfill;
pub mod checkpoint;
pub mod error;
pub mod planner;
pub mod source;
pub mod writer;

pub use backfill::{
    BackfillConfig, BackfillCoordinator, BackfillProgress, BackfillResult,
    LoggingProgressCallback, NoOpProgressCallback, ProgressCallback,
};
pub use checkpoint::{BackfillCheckpoint, BACKFILL_JOB};
pub use error::{IndexError, QueryError};
pub use planner::{Candidate, CandidateSet, QueryPlanner};
pub use source::{DocumentSource, MemoryDocumentSource};
pub use writer::{IndexOutcome, IndexWriter};
