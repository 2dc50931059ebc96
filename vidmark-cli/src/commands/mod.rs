//! Command implementations for the CLI.

/// Runs one annotation job and reports its outcome.
pub mod annotate;
