//! Interchange Codec
//!
//! Moves sheet topology through two CSV tables (components and nets) or
//! directly between sheets of one session. Export reads a sheet into
//! records; import replays the router and the label matcher against a
//! destination sheet.

pub mod codec;
pub mod records;
pub mod replay;

pub use codec::{fallback_path, read_components, read_nets, write_components, write_nets, Written};
pub use records::{AttributeRecord, ComponentRecord, ComponentRow, LabelRecord, NetRecord, NetRow};
pub use replay::{export_components, export_nets, import_components, import_nets, ImportSummary};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InterchangeError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Embedded JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Row {row}: {message}")]
    Record { row: usize, message: String },
}
