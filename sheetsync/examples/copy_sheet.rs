//! Copy a sheet through the CSV interchange tables.
//!
//! Usage: cargo run --example copy_sheet [output-dir]

use sheetsync::host::memory::MemorySession;
use sheetsync::prelude::*;
use std::path::PathBuf;

fn main() -> Result<(), SheetSyncError> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir);
    let config = SyncConfig::default();

    let mut session = MemorySession::with_blank_sheet("Schematic1", "1");
    session.insert_sheet("Schematic1", "2")?;
    session.activate("Schematic1", "2");
    SheetSyncCore::draw_voltage_divider(&mut session, DividerOptions::default(), &config)?;

    let options = CopyOptions {
        parts_path: out_dir.join("parts.csv"),
        nets_path: out_dir.join("net.csv"),
        ..Default::default()
    };
    let report = SheetSyncCore::copy_sheet(&mut session, options, &config)?;

    println!(
        "{} created and copied from {}:{}",
        report.destination, report.schematic, report.source
    );
    for file in report.parts_file.iter().chain(report.nets_file.iter()) {
        println!("  wrote {} ({} rows)", file.path.display(), file.rows);
    }
    println!(
        "  {} components, {} nets, {} labels",
        report.components, report.nets, report.labels
    );
    for d in &report.diagnostics {
        println!("  - {}", d);
    }
    Ok(())
}
