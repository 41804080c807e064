//! Subcommand implementations

pub mod costume;
pub mod remove;

pub use costume::{run_costume, CostumeReport, CostumeRun};
pub use remove::{default_output_path, run_remove};
