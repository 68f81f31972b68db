//! Command-line interface for hymnal.

mod commands;
mod helpers;

pub use commands::{is_verbose, run};
