//! Core run API shared by the CLI and the library examples.
//! No terminal or process state in here.

use std::path::Path;

use serde::Serialize;

use crate::config::SyncConfig;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::host::{HostError, HostSession, SchematicSheet};
use crate::interchange::{self, ComponentRecord, ImportSummary, InterchangeError, NetRecord};
use crate::scenarios::divider::{self, DividerOptions, DividerReport};
use crate::scenarios::replicate::{self, CopyOptions, CopyReport};

#[derive(Debug, thiserror::Error)]
pub enum SheetSyncError {
    #[error("Host unavailable: {0}")]
    HostUnavailable(String),
    #[error("Host error: {0}")]
    Host(HostError),
    #[error("Interchange error: {0}")]
    Interchange(#[from] InterchangeError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

impl From<HostError> for SheetSyncError {
    fn from(e: HostError) -> Self {
        match e {
            HostError::Unavailable(msg) => SheetSyncError::HostUnavailable(msg),
            other => SheetSyncError::Host(other),
        }
    }
}

impl From<crate::config::ConfigError> for SheetSyncError {
    fn from(e: crate::config::ConfigError) -> Self {
        SheetSyncError::Other(e.to_string())
    }
}

/// Diagnostic counts of one run, by kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiagnosticStats {
    pub host: usize,
    pub creation: usize,
    pub attribute: usize,
    pub geometry: usize,
}

impl DiagnosticStats {
    pub fn from_diagnostics(diagnostics: &[Diagnostic]) -> Self {
        let mut stats = Self::default();
        for d in diagnostics {
            match d.kind {
                DiagnosticKind::HostUnavailable => stats.host += 1,
                DiagnosticKind::CreationFailure => stats.creation += 1,
                DiagnosticKind::AttributeAccessFailure => stats.attribute += 1,
                DiagnosticKind::GeometryUnresolvable => stats.geometry += 1,
            }
        }
        stats
    }

    pub fn total(&self) -> usize {
        self.host + self.creation + self.attribute + self.geometry
    }
}

/// Contents of an interchange file pair, parsed but not replayed
#[derive(Debug, Clone, Default)]
pub struct Inspection {
    pub components: Vec<ComponentRecord>,
    pub nets: Vec<NetRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Inspection {
    pub fn label_count(&self) -> usize {
        self.nets.iter().map(|n| n.labels.len()).sum()
    }

    pub fn segment_count(&self) -> usize {
        self.nets.iter().map(|n| n.segments.len()).sum()
    }
}

/// Run API used by both the CLI and embedding code.
pub struct SheetSyncCore;

impl SheetSyncCore {
    /// Draw the two-resistor divider on the active sheet.
    pub fn draw_voltage_divider<S: HostSession>(
        session: &mut S,
        options: DividerOptions,
        config: &SyncConfig,
    ) -> Result<DividerReport, SheetSyncError> {
        divider::draw_voltage_divider(session, &options, config)
    }

    /// Copy the busiest (or preferred) sheet into a new sheet through the
    /// two CSV tables.
    pub fn copy_sheet<S: HostSession>(
        session: &mut S,
        options: CopyOptions,
        config: &SyncConfig,
    ) -> Result<CopyReport, SheetSyncError> {
        replicate::copy_sheet_via_files(session, &options, config)
    }

    /// Same copy without touching the filesystem.
    pub fn copy_sheet_direct<S: HostSession>(
        session: &mut S,
        options: CopyOptions,
        config: &SyncConfig,
    ) -> Result<CopyReport, SheetSyncError> {
        replicate::copy_sheet_direct(session, &options, config)
    }

    /// Parse interchange tables; either may be absent.
    pub fn inspect(parts: Option<&Path>, nets: Option<&Path>) -> Result<Inspection, SheetSyncError> {
        let mut inspection = Inspection::default();
        if let Some(path) = parts {
            let (records, diagnostics) =
                interchange::replay::split_rows(interchange::read_components(path)?, "components");
            inspection.components = records;
            inspection.diagnostics.extend(diagnostics);
        }
        if let Some(path) = nets {
            let (records, diagnostics) = interchange::replay::split_rows(interchange::read_nets(path)?, "nets");
            inspection.nets = records;
            inspection.diagnostics.extend(diagnostics);
        }
        Ok(inspection)
    }

    /// Replay parsed tables onto a sheet: components first, then nets.
    pub fn replay<S: SchematicSheet + ?Sized>(
        sheet: &mut S,
        inspection: &Inspection,
        config: &SyncConfig,
    ) -> ImportSummary {
        let mut summary = interchange::import_components(sheet, &inspection.components, config);
        summary.merge(interchange::import_nets(sheet, &inspection.nets, config));
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_unavailable_maps_to_its_own_variant() {
        let err: SheetSyncError = HostError::Unavailable("no view".to_string()).into();
        assert!(matches!(err, SheetSyncError::HostUnavailable(_)));
        let err: SheetSyncError = HostError::NotFound("sheet 3".to_string()).into();
        assert!(matches!(err, SheetSyncError::Host(_)));
    }

    #[test]
    fn test_stats_count_by_kind() {
        let diagnostics = vec![
            Diagnostic::creation("R1", "x"),
            Diagnostic::creation("R2", "x"),
            Diagnostic::geometry("net5v", "x"),
        ];
        let stats = DiagnosticStats::from_diagnostics(&diagnostics);
        assert_eq!(stats.creation, 2);
        assert_eq!(stats.geometry, 1);
        assert_eq!(stats.total(), 3);
    }
}
