//! SheetSync - schematic sheet automation through a host object model
//!
//! This library draws wires and net labels on a live schematic sheet and
//! replicates a sheet's topology into another sheet, either directly or
//! through a pair of CSV interchange tables. Labels are re-attached to the
//! geometrically corresponding wire even though no object identity
//! survives between sheets or sessions.
//!
//! # Quick Start
//!
//! ```no_run
//! use sheetsync::host::memory::MemorySession;
//! use sheetsync::{DividerOptions, SheetSyncCore, SyncConfig};
//!
//! let mut session = MemorySession::with_blank_sheet("Schematic1", "1");
//! let report = SheetSyncCore::draw_voltage_divider(
//!     &mut session,
//!     DividerOptions::default(),
//!     &SyncConfig::default(),
//! ).unwrap();
//!
//! for net in &report.nets {
//!     println!("{} -> {:?}", net.requested, net.name);
//! }
//! for d in &report.diagnostics {
//!     println!("{}", d);
//! }
//! ```
//!
//! # Features
//!
//! - **Segment routing**: straight wires, or two legs bent at `(x1, y2)`
//! - **Label resolution**: idempotent, with ordered placement fallbacks
//! - **Topology extraction**: segment spans plus labels and their wires
//! - **Interchange**: CSV tables with embedded JSON, `_tmp` path fallback
//! - **In-memory host**: deterministic stand-in for tests and the CLI

pub mod config;
pub mod core;
pub mod diagnostics;
pub mod geometry;
pub mod host;
pub mod interchange;
pub mod net;
pub mod scenarios;

// Re-export main types
pub use config::{ConfigError, SyncConfig};
pub use crate::core::{DiagnosticStats, Inspection, SheetSyncCore, SheetSyncError};
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use geometry::{canonical_key, distance_point_to_segment, point_on_segment, Point, SegmentKey, Span};
pub use host::{HostError, HostSession, RedrawSuspended, SchematicSheet};
pub use interchange::InterchangeError;
pub use scenarios::{CopyOptions, CopyReport, DividerOptions, DividerReport};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        CopyOptions, CopyReport, Diagnostic, DiagnosticKind, DividerOptions, DividerReport, HostSession, Point,
        SchematicSheet, SheetSyncCore, SheetSyncError, Span, SyncConfig,
    };
}
