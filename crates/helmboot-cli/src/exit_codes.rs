//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

#![allow(dead_code)]

/// Success - operation completed without errors
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Configuration error - invalid settings, repository or credentials
pub const CONFIG_ERROR: i32 = 2;

/// Download error - archive could not be fetched
pub const DOWNLOAD_ERROR: i32 = 3;

/// Archive error - unsupported format or helm missing from the archive
pub const ARCHIVE_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Command error - a helm invocation failed
pub const COMMAND_ERROR: i32 = 6;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;
