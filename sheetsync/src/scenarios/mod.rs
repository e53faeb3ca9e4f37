//! End-to-end runs built from the net and interchange layers.

pub mod divider;
pub mod replicate;

pub use divider::{draw_voltage_divider, DividerOptions, DividerReport, PlacedNet};
pub use replicate::{
    choose_source_sheet, copy_sheet_direct, copy_sheet_via_files, delete_empty_sheet, resolve_schematic, CopyOptions,
    CopyReport,
};
