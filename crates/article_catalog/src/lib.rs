//! Scanner, index generator, and template validator for a collaborative collection of article
//! summaries.
//!
//! Contributors add markdown topic documents under `topic/subtopic/` directories. Each `###` entry
//! follows a fixed template of bold labels. This crate turns that tree into structured entries,
//! regenerates the owned sections of the root index, and reports template violations.
//!
//! Everything here is a function of text already on disk. Process, git, and CLI concerns live in
//! the `xtask` crate.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod error;
pub mod index;
pub mod markdown;
pub mod model;
pub mod scanner;
pub mod stats;
pub mod validator;

pub use error::{CatalogError, CatalogResult};
pub use index::{
    update_index, Cutoff, IndexOptions, IndexUpdate, DEFAULT_RECENT_COUNT, RECENT_ARTICLES_MARKER,
    STATISTICS_MARKER,
};
pub use model::{AddedDate, ArticleEntry, CodeSample, TopicDocument, TopicLocation};
pub use scanner::{parse_document, DocumentScanner, ScanOptions};
pub use stats::{collect_stats, render_statistics, CatalogStats, StatsOptions};
pub use validator::{
    validate_document, validate_entry, FileReport, Severity, ValidationReport, Violation,
    ViolationCode,
};
