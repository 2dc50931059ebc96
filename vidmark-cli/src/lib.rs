// vidmark-cli/src/lib.rs
//
// Library portion of the vidmark CLI application.
// Contains argument definitions, logging setup and command logic.

pub mod error;
pub mod cli;
pub mod commands;
pub mod logging;

// Re-export items needed by the binary or integration tests
pub use cli::Cli;
pub use commands::annotate::{build_config, run_annotate};
pub use error::{CliErrorContext, CliResult};
