//! Sheet copy
//!
//! Replicates one sheet of a schematic into a new sheet of the same
//! schematic: export, clear the destination, import components, import
//! nets. The file-backed path goes through the two CSV tables; the direct
//! path hands the same records over in memory.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::core::SheetSyncError;
use crate::diagnostics::Diagnostic;
use crate::host::{HostSession, RedrawSuspended, SchematicSheet};
use crate::interchange::replay::split_rows;
use crate::interchange::{
    export_components, export_nets, import_components, import_nets, read_components, read_nets, write_components,
    write_nets, ComponentRecord, ImportSummary, NetRecord, Written,
};

#[derive(Clone, Debug)]
pub struct CopyOptions {
    /// Schematic to work in, matched case-insensitively
    pub schematic: String,
    /// Source sheet used when present; otherwise the busiest sheet
    pub preferred_source: Option<String>,
    pub destination: String,
    pub parts_path: PathBuf,
    pub nets_path: PathBuf,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            schematic: "Schematic1".to_string(),
            preferred_source: Some("2".to_string()),
            destination: "Schematic2".to_string(),
            parts_path: PathBuf::from("parts.csv"),
            nets_path: PathBuf::from("net.csv"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TableFile {
    pub path: PathBuf,
    pub fallback: bool,
    pub rows: usize,
}

impl From<Written> for TableFile {
    fn from(w: Written) -> Self {
        Self {
            path: w.path,
            fallback: w.fallback,
            rows: w.rows,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CopyReport {
    pub schematic: String,
    pub source: String,
    pub destination: String,
    /// Tables written, for the file-backed copy
    pub parts_file: Option<TableFile>,
    pub nets_file: Option<TableFile>,
    pub components: usize,
    pub nets: usize,
    pub labels: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl CopyReport {
    pub fn used_fallback(&self) -> bool {
        self.parts_file.as_ref().is_some_and(|f| f.fallback) || self.nets_file.as_ref().is_some_and(|f| f.fallback)
    }
}

/// The preferred schematic (any case), else the first one available.
pub fn resolve_schematic<S: HostSession>(session: &S, preferred: &str) -> Result<String, SheetSyncError> {
    let schematics = session.schematics()?;
    schematics
        .iter()
        .find(|name| name.eq_ignore_ascii_case(preferred))
        .or_else(|| schematics.first())
        .cloned()
        .ok_or_else(|| SheetSyncError::HostUnavailable("no schematic is open".to_string()))
}

/// `preferred` when it exists, else the sheet holding the most components
/// and nets (the first one on ties).
pub fn choose_source_sheet<S: HostSession>(
    session: &S,
    schematic: &str,
    preferred: Option<&str>,
) -> Result<Option<String>, SheetSyncError> {
    let sheets = session.sheets(schematic)?;
    if let Some(preferred) = preferred {
        if sheets.iter().any(|s| s == preferred) {
            return Ok(Some(preferred.to_string()));
        }
    }
    let mut best: Option<(&String, usize)> = None;
    for name in &sheets {
        let Some(sheet) = session.sheet(schematic, name) else {
            continue;
        };
        let count = sheet.object_count();
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((name, count));
        }
    }
    Ok(best.map(|(name, _)| name.clone()).or_else(|| sheets.first().cloned()))
}

/// Delete the sheet only when it holds no components and no nets.
pub fn delete_empty_sheet<S: HostSession>(session: &mut S, schematic: &str, sheet: &str) -> Result<bool, SheetSyncError> {
    let Some(view) = session.sheet(schematic, sheet) else {
        return Ok(false);
    };
    if !view.components().is_empty() || !view.nets().is_empty() {
        return Ok(false);
    }
    session.delete_sheet(schematic, sheet)?;
    info!("Deleted empty sheet {}:{}", schematic, sheet);
    Ok(true)
}

struct CopyPlan {
    schematic: String,
    source: String,
    destination: String,
}

fn prepare<S: HostSession>(session: &mut S, options: &CopyOptions) -> Result<CopyPlan, SheetSyncError> {
    let schematic = resolve_schematic(session, &options.schematic)?;
    let source = choose_source_sheet(session, &schematic, options.preferred_source.as_deref())?
        .ok_or_else(|| SheetSyncError::HostUnavailable(format!("{} has no sheets", schematic)))?;
    if source == options.destination {
        return Err(SheetSyncError::Other(format!(
            "source and destination are the same sheet '{}'",
            source
        )));
    }
    if let Err(e) = session.insert_sheet(&schematic, &options.destination) {
        debug!("Insert of {} not performed: {}", options.destination, e);
    }
    if session.sheet(&schematic, &options.destination).is_none() {
        return Err(SheetSyncError::HostUnavailable(format!(
            "cannot open destination sheet {}:{}",
            schematic, options.destination
        )));
    }
    Ok(CopyPlan {
        schematic,
        source,
        destination: options.destination.clone(),
    })
}

fn export_source<S: HostSession>(
    session: &S,
    plan: &CopyPlan,
    config: &SyncConfig,
) -> Result<(Vec<ComponentRecord>, Vec<NetRecord>), SheetSyncError> {
    let source = session.sheet(&plan.schematic, &plan.source).ok_or_else(|| {
        SheetSyncError::HostUnavailable(format!("cannot open source sheet {}:{}", plan.schematic, plan.source))
    })?;
    Ok((export_components(source), export_nets(source, config)))
}

fn replay_into<S: HostSession>(
    session: &mut S,
    plan: &CopyPlan,
    components: &[ComponentRecord],
    nets: &[NetRecord],
    config: &SyncConfig,
) -> Result<ImportSummary, SheetSyncError> {
    let destination = session.sheet_mut(&plan.schematic, &plan.destination).ok_or_else(|| {
        SheetSyncError::HostUnavailable(format!(
            "cannot open destination sheet {}:{}",
            plan.schematic, plan.destination
        ))
    })?;
    destination.clear();
    let mut summary = import_components(destination, components, config);
    summary.merge(import_nets(destination, nets, config));
    Ok(summary)
}

fn finish<S: HostSession>(
    session: &mut S,
    plan: CopyPlan,
    summary: ImportSummary,
    files: Option<(TableFile, TableFile)>,
) -> CopyReport {
    if let Some(destination) = session.sheet_mut(&plan.schematic, &plan.destination) {
        destination.refresh();
    }
    for d in &summary.diagnostics {
        warn!("{}", d);
    }
    info!(
        "{} copied from {}:{} ({} components, {} nets, {} labels)",
        plan.destination, plan.schematic, plan.source, summary.components, summary.nets, summary.labels
    );
    let (parts_file, nets_file) = match files {
        Some((parts, nets)) => (Some(parts), Some(nets)),
        None => (None, None),
    };
    CopyReport {
        schematic: plan.schematic,
        source: plan.source,
        destination: plan.destination,
        parts_file,
        nets_file,
        components: summary.components,
        nets: summary.nets,
        labels: summary.labels,
        diagnostics: summary.diagnostics,
    }
}

/// Copy through the components and nets tables on disk. Unwritable table
/// paths fall back to `_tmp` siblings, reported in the result.
pub fn copy_sheet_via_files<S: HostSession>(
    session: &mut S,
    options: &CopyOptions,
    config: &SyncConfig,
) -> Result<CopyReport, SheetSyncError> {
    let plan = prepare(session, options)?;
    let mut guard = RedrawSuspended::new(session);

    let (components, nets) = export_source(&*guard, &plan, config)?;
    let parts_written = write_components(&options.parts_path, &components)?;
    let nets_written = write_nets(&options.nets_path, &nets)?;

    let (components, mut diagnostics) = split_rows(read_components(&parts_written.path)?, "components");
    let (nets, net_diagnostics) = split_rows(read_nets(&nets_written.path)?, "nets");
    diagnostics.extend(net_diagnostics);

    let mut summary = replay_into(&mut *guard, &plan, &components, &nets, config)?;
    diagnostics.append(&mut summary.diagnostics);
    summary.diagnostics = diagnostics;
    drop(guard);

    Ok(finish(
        session,
        plan,
        summary,
        Some((parts_written.into(), nets_written.into())),
    ))
}

/// Copy within the session, without interchange files.
pub fn copy_sheet_direct<S: HostSession>(
    session: &mut S,
    options: &CopyOptions,
    config: &SyncConfig,
) -> Result<CopyReport, SheetSyncError> {
    let plan = prepare(session, options)?;
    let mut guard = RedrawSuspended::new(session);
    let (components, nets) = export_source(&*guard, &plan, config)?;
    let summary = replay_into(&mut *guard, &plan, &components, &nets, config)?;
    drop(guard);
    Ok(finish(session, plan, summary, None))
}
