//! Subcommand implementations

pub mod run;
pub mod shape;
