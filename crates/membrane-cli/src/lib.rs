//! Operator CLI for membrane stores
//!
//! The `membrane` binary is a thin clap front end over these modules, which
//! are also what the integration tests drive.

pub mod commands;
pub mod config;

pub use commands::run::{parse_command, run_session, ScriptCommand, Session, SessionSummary};
pub use config::{load_config, CliConfig};
