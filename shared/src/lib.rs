//! Shared types and utilities for openflags
//!
//! This crate holds the `open(2)` flag decoder used by the WASM gadget and
//! the command-line tool, along with small parsing helpers.

pub mod flags;
pub mod utils;

// Re-export commonly used types
pub use flags::{decode_flags, option_flag_names, AccessMode, DecodedFlags, OptionFlags, FLAG_SEPARATOR};
