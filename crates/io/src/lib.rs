// File I/O for position reconciliation reports.
//
// Export only: the workbook is a presentation snapshot of one run, not a
// round-trip format. Input feeds are plain CSV and are parsed upstream.

pub mod xlsx;

pub use xlsx::{default_output_path, write_report};
