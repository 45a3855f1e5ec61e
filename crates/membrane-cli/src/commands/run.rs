//! `run` subcommand: scripted store sessions
//!
//! A session reads newline-separated commands and applies them to one
//! in-memory store. Blank lines and lines starting with `#` are skipped. A
//! failing command is reported on the output and the session moves on.
//!
//! ```text
//! create 2,3,5
//! child 1 7
//! fill 1 1.5
//! set 1 1,2,4 9
//! get 1 1,2,4
//! print
//! ```

use crate::config::CliConfig;
use anyhow::{anyhow, bail, Context, Result};
use membrane_core::{MembraneId, PrimeShape};
use membrane_store::MembraneStore;
use membrane_sync::{snapshot, SyncEngine};
use std::io::{BufRead, Write};
use tracing::{debug, warn};

/// One parsed script line
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptCommand {
    /// `create <shape>`
    Create(PrimeShape),
    /// `child <parent> <shape>`
    Child(MembraneId, PrimeShape),
    /// `destroy <id>`
    Destroy(MembraneId),
    /// `reshape <id> <shape>`
    Reshape(MembraneId, PrimeShape),
    /// `add <id> <symbol>`
    Add(MembraneId, String),
    /// `remove <id> <symbol>`
    Remove(MembraneId, String),
    /// `transfer <from> <to> <symbol>`
    Transfer(MembraneId, MembraneId, String),
    /// `get <id> <indices>`
    Get(MembraneId, Vec<u32>),
    /// `set <id> <indices> <value>`
    Set(MembraneId, Vec<u32>, f32),
    /// `fill <id> <value>`
    Fill(MembraneId, f32),
    /// `energy <id> <amount>`
    Energy(MembraneId, u32),
    /// `print [id]`
    Print(Option<MembraneId>),
    /// `snapshot <id>`
    Snapshot(MembraneId),
    /// `sync <local> <remote>`: merge the remote membrane's snapshot into local
    Sync(MembraneId, MembraneId),
    /// `count`
    Count,
}

/// Parse one line; `None` for blanks and comments
pub fn parse_command(line: &str) -> Result<Option<ScriptCommand>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let words: Vec<&str> = line.split_whitespace().collect();
    let (name, args) = match words.split_first() {
        Some((name, args)) => (*name, args),
        None => return Ok(None),
    };

    let command = match (name, args) {
        ("create", [shape]) => ScriptCommand::Create(parse_shape(shape)?),
        ("child", [parent, shape]) => ScriptCommand::Child(parse_id(parent)?, parse_shape(shape)?),
        ("destroy", [id]) => ScriptCommand::Destroy(parse_id(id)?),
        ("reshape" | "resize", [id, shape]) => {
            ScriptCommand::Reshape(parse_id(id)?, parse_shape(shape)?)
        }
        ("add", [id, symbol]) => ScriptCommand::Add(parse_id(id)?, symbol.to_string()),
        ("remove", [id, symbol]) => ScriptCommand::Remove(parse_id(id)?, symbol.to_string()),
        ("transfer", [from, to, symbol]) => {
            ScriptCommand::Transfer(parse_id(from)?, parse_id(to)?, symbol.to_string())
        }
        ("get", [id, indices]) => ScriptCommand::Get(parse_id(id)?, parse_indices(indices)?),
        ("set", [id, indices, value]) => ScriptCommand::Set(
            parse_id(id)?,
            parse_indices(indices)?,
            parse_value(value)?,
        ),
        ("fill", [id, value]) => ScriptCommand::Fill(parse_id(id)?, parse_value(value)?),
        ("energy", [id, amount]) => ScriptCommand::Energy(
            parse_id(id)?,
            amount
                .parse()
                .with_context(|| format!("'{amount}' is not an energy amount"))?,
        ),
        ("print", []) => ScriptCommand::Print(None),
        ("print", [id]) => ScriptCommand::Print(Some(parse_id(id)?)),
        ("snapshot", [id]) => ScriptCommand::Snapshot(parse_id(id)?),
        ("sync", [local, remote]) => ScriptCommand::Sync(parse_id(local)?, parse_id(remote)?),
        ("count", []) => ScriptCommand::Count,
        _ => bail!("unrecognized command '{line}'"),
    };
    Ok(Some(command))
}

fn parse_id(raw: &str) -> Result<MembraneId> {
    raw.parse()
        .with_context(|| format!("'{raw}' is not a membrane id"))
}

fn parse_shape(raw: &str) -> Result<PrimeShape> {
    raw.parse()
        .with_context(|| format!("'{raw}' is not a shape"))
}

fn parse_indices(raw: &str) -> Result<Vec<u32>> {
    raw.split(',')
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse()
                .with_context(|| format!("'{part}' is not an index"))
        })
        .collect()
}

fn parse_value(raw: &str) -> Result<f32> {
    raw.parse()
        .with_context(|| format!("'{raw}' is not a number"))
}

/// Outcome of a whole session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Commands that ran successfully
    pub executed: usize,
    /// Commands that failed to parse or run
    pub failed: usize,
}

/// One store plus the sync engine used by `sync` commands
pub struct Session {
    store: MembraneStore,
    engine: SyncEngine,
}

impl Session {
    /// Fresh session built from the CLI configuration
    pub fn new(config: &CliConfig) -> Self {
        Self {
            store: MembraneStore::with_config(config.store.clone()),
            engine: SyncEngine::new(config.sync.clone()),
        }
    }

    /// The session's store
    pub fn store(&self) -> &MembraneStore {
        &self.store
    }

    /// Parse and run one line, returning what it prints
    pub fn execute_line(&mut self, line: &str) -> Result<Option<String>> {
        match parse_command(line)? {
            Some(command) => self.execute(command).map(Some),
            None => Ok(None),
        }
    }

    /// Run one command, returning what it prints
    pub fn execute(&mut self, command: ScriptCommand) -> Result<String> {
        debug!(?command, "Executing script command");
        let store = &mut self.store;
        let output = match command {
            ScriptCommand::Create(shape) => store.create(shape)?.value().to_string(),
            ScriptCommand::Child(parent, shape) => {
                store.create_child(parent, shape)?.value().to_string()
            }
            ScriptCommand::Destroy(id) => {
                let released = store.destroy(id)?;
                for gone in &released {
                    self.engine.forget(*gone);
                }
                format!("destroyed {}", released.len())
            }
            ScriptCommand::Reshape(id, shape) => {
                store.reshape(id, shape)?;
                String::new()
            }
            ScriptCommand::Add(id, symbol) => {
                store.add_object(id, &symbol)?;
                String::new()
            }
            ScriptCommand::Remove(id, symbol) => {
                store.remove_object(id, &symbol)?;
                String::new()
            }
            ScriptCommand::Transfer(from, to, symbol) => {
                store.transfer_object(from, to, &symbol)?;
                String::new()
            }
            ScriptCommand::Get(id, indices) => store.get(id, &indices)?.to_string(),
            ScriptCommand::Set(id, indices, value) => {
                store.set(id, &indices, value)?;
                String::new()
            }
            ScriptCommand::Fill(id, value) => {
                store.fill(id, value)?;
                String::new()
            }
            ScriptCommand::Energy(id, amount) => store.consume_energy(id, amount)?.to_string(),
            ScriptCommand::Print(Some(id)) => store.render_structure(id)?,
            ScriptCommand::Print(None) => store.render_forest(),
            ScriptCommand::Snapshot(id) => serde_json::to_string(&snapshot(store, id)?)?,
            ScriptCommand::Sync(local, remote) => {
                let remote = snapshot(store, remote)?;
                let report = self.engine.apply_remote(store, local, &remote)?;
                format!(
                    "{:?} version={} checksum={:08x}",
                    report.action, report.version, report.checksum
                )
            }
            ScriptCommand::Count => store.len().to_string(),
        };
        Ok(output)
    }

    /// Run every line of `input`, writing results and errors to `output`
    ///
    /// A line that is not valid UTF-8 counts as a failed command; only I/O
    /// errors end the session.
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        mut input: R,
        output: &mut W,
    ) -> Result<SessionSummary> {
        let mut summary = SessionSummary::default();
        let mut raw = Vec::new();
        let mut number = 0usize;
        loop {
            raw.clear();
            if input
                .read_until(b'\n', &mut raw)
                .context("Failed to read script")?
                == 0
            {
                break;
            }
            number += 1;

            let result = match std::str::from_utf8(&raw) {
                Ok(line) => self.execute_line(line),
                Err(err) => Err(anyhow!("line is not valid UTF-8: {err}")),
            };
            match result {
                Ok(None) => {}
                Ok(Some(text)) => {
                    summary.executed += 1;
                    write_block(output, &text)?;
                }
                Err(err) => {
                    summary.failed += 1;
                    warn!(line = number, error = %err, "Script command failed");
                    writeln!(output, "error (line {number}): {err:#}")?;
                }
            }
        }
        Ok(summary)
    }
}

fn write_block<W: Write>(output: &mut W, text: &str) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    output.write_all(text.as_bytes())?;
    if !text.ends_with('\n') {
        output.write_all(b"\n")?;
    }
    Ok(())
}

/// Run a session over `input` with a fresh store
pub fn run_session<R: BufRead, W: Write>(
    config: &CliConfig,
    input: R,
    output: &mut W,
) -> Result<SessionSummary> {
    let mut session = Session::new(config);
    let summary = session.run(input, output)?;
    if summary.failed > 0 {
        warn!(failed = summary.failed, "Session finished with errors");
    }
    Ok(summary)
}
