//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Input error - malformed, oversized or badly encoded document
pub const INPUT_ERROR: i32 = 3;

/// Naming error - no unique filename strategy for a batch
pub const NAMING_ERROR: i32 = 4;

/// IO error - input not readable, output not writable
pub const IO_ERROR: i32 = 5;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;
