//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

#![allow(dead_code)]

/// Success - schema generated
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure or cancelled fetch
pub const ERROR: i32 = 1;

/// Decode error - values document is not valid YAML or not a mapping
pub const DECODE_ERROR: i32 = 2;

/// Schema error - compile, generation or OpenAPI validation failed
pub const SCHEMA_ERROR: i32 = 3;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Not found - the chart carries no values.yaml nor values.yml
pub const NOT_FOUND: i32 = 6;

/// Network error - repository unreachable, HTTP failure or chart lookup failed
pub const NETWORK_ERROR: i32 = 7;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;
