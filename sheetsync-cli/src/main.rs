//! SheetSync CLI - schematic sheet automation from the command line.
//!
//! Runs against the in-memory host, which behaves like the live schematic
//! tool for everything the library relies on.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sheetsync::host::memory::MemorySession;
use sheetsync::host::HostSession;
use sheetsync::interchange::ImportSummary;
use sheetsync::{
    CopyOptions, CopyReport, Diagnostic, DiagnosticStats, DividerOptions, DividerReport, Inspection, SheetSyncCore,
    SyncConfig,
};
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sheetsync")]
#[command(about = "Schematic sheet wiring, labelling and replication tool", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON file overriding host conventions (placeholder prefixes, tolerance...)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Draw the two-resistor voltage divider on a blank sheet
    Divider {
        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Component value written on both resistors
        #[arg(long, default_value = "4.7K")]
        value: String,

        /// Exit with error code if any diagnostic was reported
        #[arg(long)]
        fail_on_diagnostics: bool,
    },

    /// Draw the divider on sheet "2", then copy it into a new sheet
    Copy {
        /// Directory receiving parts.csv and net.csv
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        out_dir: PathBuf,

        /// Copy in memory without writing interchange files
        #[arg(long)]
        direct: bool,

        /// Name of the sheet to create
        #[arg(long, default_value = "Schematic2")]
        destination: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Exit with error code if any diagnostic was reported
        #[arg(long)]
        fail_on_diagnostics: bool,
    },

    /// Summarise interchange tables without replaying them
    Inspect {
        /// Components table
        #[arg(long, value_name = "FILE")]
        parts: Option<PathBuf>,

        /// Nets table
        #[arg(long, value_name = "FILE")]
        nets: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Rebuild interchange tables onto a blank sheet
    Replay {
        /// Components table
        #[arg(long, value_name = "FILE")]
        parts: Option<PathBuf>,

        /// Nets table
        #[arg(long, value_name = "FILE")]
        nets: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Exit with error code if any diagnostic was reported
        #[arg(long)]
        fail_on_diagnostics: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for scripting
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Divider {
            format,
            value,
            fail_on_diagnostics,
        } => handle_divider(&config, value, &format, fail_on_diagnostics),
        Commands::Copy {
            out_dir,
            direct,
            destination,
            format,
            fail_on_diagnostics,
        } => handle_copy(&config, &out_dir, direct, destination, &format, fail_on_diagnostics),
        Commands::Inspect { parts, nets, format } => handle_inspect(parts.as_deref(), nets.as_deref(), &format),
        Commands::Replay {
            parts,
            nets,
            format,
            fail_on_diagnostics,
        } => handle_replay(&config, parts.as_deref(), nets.as_deref(), &format, fail_on_diagnostics),
    });

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };
    process::exit(exit_code);
}

/// `RUST_LOG` wins over `-v`; logs go to stderr so JSON output stays clean.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<SyncConfig> {
    match path {
        Some(path) => {
            let config = SyncConfig::load(path).with_context(|| format!("loading config {}", path.display()))?;
            debug!("Loaded config from {}", path.display());
            Ok(config)
        }
        None => Ok(SyncConfig::default()),
    }
}

fn exit_code(diagnostics: &[Diagnostic], fail_on_diagnostics: bool) -> i32 {
    if fail_on_diagnostics && !diagnostics.is_empty() {
        1
    } else {
        0
    }
}

fn handle_divider(config: &SyncConfig, value: String, format: &OutputFormat, fail_on_diagnostics: bool) -> Result<i32> {
    let mut session = MemorySession::with_blank_sheet("Schematic1", "1");
    let options = DividerOptions {
        value,
        ..Default::default()
    };
    let report = SheetSyncCore::draw_voltage_divider(&mut session, options, config).context("drawing voltage divider")?;
    match format {
        OutputFormat::Human => print_divider(&report),
        OutputFormat::Json => print_json(&serde_json::json!({
            "divider": report,
            "stats": DiagnosticStats::from_diagnostics(&report.diagnostics),
        }))?,
    }
    Ok(exit_code(&report.diagnostics, fail_on_diagnostics))
}

fn handle_copy(
    config: &SyncConfig,
    out_dir: &Path,
    direct: bool,
    destination: String,
    format: &OutputFormat,
    fail_on_diagnostics: bool,
) -> Result<i32> {
    let mut session = MemorySession::with_blank_sheet("Schematic1", "1");
    session
        .insert_sheet("Schematic1", "2")
        .context("creating source sheet")?;
    session.activate("Schematic1", "2");
    let source = SheetSyncCore::draw_voltage_divider(&mut session, DividerOptions::default(), config)
        .context("drawing source sheet")?;

    let options = CopyOptions {
        destination,
        parts_path: out_dir.join("parts.csv"),
        nets_path: out_dir.join("net.csv"),
        ..Default::default()
    };
    let report = if direct {
        SheetSyncCore::copy_sheet_direct(&mut session, options, config)
    } else {
        SheetSyncCore::copy_sheet(&mut session, options, config)
    }
    .context("copying sheet")?;

    let mut diagnostics = source.diagnostics.clone();
    diagnostics.extend(report.diagnostics.iter().cloned());
    info!(
        "Copy into {} finished ({}) with {} diagnostic(s)",
        report.destination,
        if direct { "direct" } else { "via files" },
        diagnostics.len()
    );
    match format {
        OutputFormat::Human => print_copy(&report),
        OutputFormat::Json => print_json(&serde_json::json!({
            "copy": report,
            "stats": DiagnosticStats::from_diagnostics(&diagnostics),
        }))?,
    }
    Ok(exit_code(&diagnostics, fail_on_diagnostics))
}

fn handle_inspect(parts: Option<&Path>, nets: Option<&Path>, format: &OutputFormat) -> Result<i32> {
    if parts.is_none() && nets.is_none() {
        anyhow::bail!("nothing to inspect: pass --parts and/or --nets");
    }
    let inspection = SheetSyncCore::inspect(parts, nets).context("reading interchange tables")?;
    match format {
        OutputFormat::Human => print_inspection(&inspection),
        OutputFormat::Json => print_json(&inspection_json(&inspection))?,
    }
    Ok(0)
}

fn handle_replay(
    config: &SyncConfig,
    parts: Option<&Path>,
    nets: Option<&Path>,
    format: &OutputFormat,
    fail_on_diagnostics: bool,
) -> Result<i32> {
    if parts.is_none() && nets.is_none() {
        anyhow::bail!("nothing to replay: pass --parts and/or --nets");
    }
    let inspection = SheetSyncCore::inspect(parts, nets).context("reading interchange tables")?;
    let mut session = MemorySession::with_blank_sheet("Schematic1", "1");
    let sheet = session.active_sheet_mut().context("opening blank sheet")?;
    let mut summary = SheetSyncCore::replay(sheet, &inspection, config);
    let mut diagnostics = inspection.diagnostics.clone();
    diagnostics.append(&mut summary.diagnostics);
    summary.diagnostics = diagnostics;
    info!(
        "Replay finished: {} components, {} nets, {} diagnostic(s)",
        summary.components,
        summary.nets,
        summary.diagnostics.len()
    );

    match format {
        OutputFormat::Human => print_summary(&summary),
        OutputFormat::Json => print_json(&serde_json::json!({
            "components": summary.components,
            "nets": summary.nets,
            "labels": summary.labels,
            "diagnostics": summary.diagnostics,
            "stats": DiagnosticStats::from_diagnostics(&summary.diagnostics),
        }))?,
    }
    Ok(exit_code(&summary.diagnostics, fail_on_diagnostics))
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    println!("\n  Diagnostics:");
    for d in diagnostics {
        println!("    {}", d);
    }
}

fn print_divider(report: &DividerReport) {
    println!("Voltage divider");
    println!("{}", "─".repeat(60));
    println!("  Components: {}", report.components.join(", "));
    for net in &report.nets {
        let status = match (&net.name, net.label_created) {
            (Some(name), true) => format!("labelled {}", name),
            (Some(name), false) => format!("already named {}", name),
            (None, _) => "unnamed".to_string(),
        };
        println!("  {:<10} {} -> {}  {}", net.requested, net.from, net.to, status);
    }
    println!("  DEVICE attributes hidden: {}", report.hidden_devices);
    print_diagnostics(&report.diagnostics);
}

fn print_copy(report: &CopyReport) {
    println!(
        "{} created and copied from {}:{}",
        report.destination, report.schematic, report.source
    );
    println!("{}", "─".repeat(60));
    match (&report.parts_file, &report.nets_file) {
        (Some(parts), Some(nets)) => {
            println!("  Parts table: {} ({} rows)", parts.path.display(), parts.rows);
            println!("  Nets table:  {} ({} rows)", nets.path.display(), nets.rows);
            if report.used_fallback() {
                println!("  (fallback paths used)");
            }
        }
        _ => println!("  Copied directly, no interchange files"),
    }
    println!("  Components: {}", report.components);
    println!("  Nets:       {}", report.nets);
    println!("  Labels:     {}", report.labels);
    print_diagnostics(&report.diagnostics);
}

fn print_inspection(inspection: &Inspection) {
    println!("Interchange tables");
    println!("{}", "─".repeat(60));
    println!("  Components: {}", inspection.components.len());
    for c in &inspection.components {
        println!(
            "    {:<8} {}/{} at {} ({} attributes)",
            c.refdes,
            c.partition,
            c.symbol,
            c.location,
            c.attributes.len()
        );
    }
    println!(
        "  Nets: {} ({} segments, {} labels)",
        inspection.nets.len(),
        inspection.segment_count(),
        inspection.label_count()
    );
    for (i, net) in inspection.nets.iter().enumerate() {
        let labels: Vec<&str> = net.labels.iter().map(|l| l.name.as_str()).collect();
        println!("    #{:<3} {} segment(s)  [{}]", i + 1, net.segments.len(), labels.join(", "));
    }
    print_diagnostics(&inspection.diagnostics);
}

fn inspection_json(inspection: &Inspection) -> serde_json::Value {
    serde_json::json!({
        "components": inspection.components.iter().map(|c| serde_json::json!({
            "refdes": c.refdes,
            "partition": c.partition,
            "symbol": c.symbol,
            "x": c.location.x,
            "y": c.location.y,
            "attributes": c.attributes,
        })).collect::<Vec<_>>(),
        "nets": inspection.nets.iter().map(|n| serde_json::json!({
            "segments": n.segments,
            "labels": n.labels,
        })).collect::<Vec<_>>(),
        "summary": {
            "components": inspection.components.len(),
            "nets": inspection.nets.len(),
            "segments": inspection.segment_count(),
            "labels": inspection.label_count(),
        },
        "diagnostics": inspection.diagnostics,
    })
}

fn print_summary(summary: &ImportSummary) {
    println!("Replay");
    println!("{}", "─".repeat(60));
    println!("  Components: {}", summary.components);
    println!("  Nets:       {}", summary.nets);
    println!("  Labels:     {}", summary.labels);
    print_diagnostics(&summary.diagnostics);
}
