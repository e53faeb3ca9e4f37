//! Draw the two-resistor divider on a blank sheet and print what landed.

use sheetsync::host::memory::MemorySession;
use sheetsync::prelude::*;

fn main() -> Result<(), SheetSyncError> {
    let value = std::env::args().nth(1).unwrap_or_else(|| "4.7K".to_string());

    let mut session = MemorySession::with_blank_sheet("Schematic1", "1");
    let options = DividerOptions {
        value,
        ..Default::default()
    };
    let report = SheetSyncCore::draw_voltage_divider(&mut session, options, &SyncConfig::default())?;

    println!("Placed: {}", report.components.join(", "));
    for net in &report.nets {
        match &net.name {
            Some(name) => println!("  {} -> {}  named {}", net.from, net.to, name),
            None => println!("  {} -> {}  left unnamed", net.from, net.to),
        }
    }

    if !report.diagnostics.is_empty() {
        println!("\nDiagnostics:");
        for d in &report.diagnostics {
            println!("  - {}", d);
        }
    }

    if !report.completed {
        println!("\nDivider incomplete.");
        std::process::exit(1);
    }
    Ok(())
}
