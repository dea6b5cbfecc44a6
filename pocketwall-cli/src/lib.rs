//! Command-line front end for the PocketWall protection layer.
//!
//! Runs every backup, license, trial and crypto operation against
//! JSON files in a data directory. See [`workspace`] for the layout.

pub mod args;
pub mod commands;
pub mod workspace;

pub use args::Cli;
pub use commands::run;
pub use workspace::{default_data_dir, Workspace};
