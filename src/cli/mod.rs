//! Command-line interface for augur
//!
//! - `args`: clap definitions
//! - `run`: entry point and dispatch
//! - `commands`: command implementations
//! - `report`: user-facing error rendering

pub mod args;
mod commands;
mod report;
mod run;

pub use args::{Cli, Commands, build_cli};
pub use report::display_for_user;
pub use run::run;
