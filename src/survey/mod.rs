//! Survey export ingestion.
//!
//! Loading turns a delimited export into an immutable [`ResponseTable`];
//! [`SurveyStore`] shares that table between requests and owns the only
//! way to replace it.

pub mod loader;
pub mod schema;
pub mod store;
pub mod table;

pub use loader::{load_table, LoadOptions};
pub use schema::{CourseArea, Field, Schema};
pub use store::SurveyStore;
pub use table::ResponseTable;

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading a survey export.
#[derive(Debug, Error)]
pub enum SurveyError {
    #[error("input file not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("failed to open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {source_name}: {source}")]
    Parse {
        source_name: String,
        #[source]
        source: csv::Error,
    },

    #[error("{source_name} has no header row")]
    EmptyInput { source_name: String },

    #[error("none of the expected survey columns were found in {source_name}; expected headers:\n{expected}")]
    SchemaMismatch {
        source_name: String,
        expected: String,
    },

    #[error("{source_name} is missing survey columns: {fields}")]
    MissingColumns { source_name: String, fields: String },

    #[error("unknown survey field '{key}' in schema configuration")]
    UnknownField { key: String },
}
