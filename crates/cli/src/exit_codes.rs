//! CLI exit code registry.
//!
//! This is the single source of truth for all exit codes. Exit codes are
//! part of the shell contract; scripts rely on them.
//!
//! | Code | Description                                                |
//! |------|------------------------------------------------------------|
//! | 0    | Success (including a declined interactive confirmation)    |
//! | 1    | General error (unspecified)                                |
//! | 2    | Usage error (bad args, confirmation needed without a tty)  |
//! | 3    | Input feed error (unreadable file, missing column, bad qty)|
//! | 4    | Mapping integrity error (misaligned or misattributed)      |
//! | 5    | Output workbook write error                                |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, confirmation required without a tty.
pub const EXIT_USAGE: u8 = 2;

/// Input error - unreadable feed, missing column, unparseable quantity.
pub const EXIT_INPUT: u8 = 3;

/// Mapping integrity error - the service response cannot be safely
/// attributed back to the submitted records.
pub const EXIT_MAPPING: u8 = 4;

/// Output error - the workbook could not be written.
pub const EXIT_OUTPUT: u8 = 5;
