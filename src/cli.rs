use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::warn;

use crate::config::{SessionConfig, SessionOptions};
use crate::domain::entities::address::{letters_to_col, AddressParseError, AddressRange, CellRef};
use crate::domain::entities::edit::RegionColor;
use crate::domain::entities::value::CellValue;
use crate::infra::grid::memory::MemoryGrid;
use crate::usecase::services::edit_session::{CommitOutcome, EditSession, MutationOutcome};
use crate::usecase::services::session_registry::SessionRegistry;

#[derive(Debug, Parser)]
#[command(
    name = "gridedit",
    about = "Edit a SQLite table on an in-memory grid and sync the edits back"
)]
pub struct Cli {
    /// SQLite database file (defaults to the per-user data directory)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Table to edit
    #[arg(long)]
    pub table: String,

    /// Row filter appended as a WHERE clause
    #[arg(long = "where")]
    pub filter: Option<String>,

    /// Commit every edit immediately
    #[arg(long)]
    pub auto_commit: bool,

    /// Draw the table without a header row
    #[arg(long)]
    pub no_header: bool,

    /// Top-left cell of the table on the grid
    #[arg(long, default_value = "A1")]
    pub anchor: CellRef,
}

impl Cli {
    pub fn session_config(&self) -> SessionConfig {
        let mut config = SessionConfig::new(&self.table)
            .with_anchor(self.anchor)
            .with_options(SessionOptions {
                auto_commit: self.auto_commit,
                header_row: !self.no_header,
            });
        if let Some(filter) = &self.filter {
            config = config.with_filter(filter);
        }
        config
    }
}

/// One line of host input.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    Set { cell: CellRef, value: CellValue },
    DeleteRow { row: usize, count: usize },
    DeleteColumn { col: usize, count: usize },
    Select(AddressRange),
    Commit,
    Revert,
    Refresh,
    Auto(bool),
    Show,
    Status,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
    #[error(transparent)]
    Address(#[from] AddressParseError),
    #[error("invalid number: {0}")]
    InvalidNumber(String),
}

fn parse_count(arg: Option<&str>) -> Result<usize, CommandParseError> {
    match arg {
        None => Ok(1),
        Some(text) => text
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| CommandParseError::InvalidNumber(text.to_string())),
    }
}

impl FromStr for HostCommand {
    type Err = CommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim_start();
        let mut args = rest.split_whitespace();

        match verb.to_ascii_lowercase().as_str() {
            "" => Err(CommandParseError::Empty),
            "set" => {
                let (cell, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                if cell.is_empty() {
                    return Err(CommandParseError::MissingArgument("cell"));
                }
                Ok(HostCommand::Set {
                    cell: cell.parse()?,
                    value: CellValue::parse_input(value.trim_start()),
                })
            }
            "delete-row" => {
                let row = args.next().ok_or(CommandParseError::MissingArgument("row"))?;
                let row = row
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| CommandParseError::InvalidNumber(row.to_string()))?;
                Ok(HostCommand::DeleteRow {
                    row,
                    count: parse_count(args.next())?,
                })
            }
            "delete-col" => {
                let col = args.next().ok_or(CommandParseError::MissingArgument("column"))?;
                let col = col
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .or_else(|| letters_to_col(col))
                    .ok_or_else(|| CommandParseError::InvalidNumber(col.to_string()))?;
                Ok(HostCommand::DeleteColumn {
                    col,
                    count: parse_count(args.next())?,
                })
            }
            "select" => {
                let range = args.next().ok_or(CommandParseError::MissingArgument("range"))?;
                Ok(HostCommand::Select(range.parse()?))
            }
            "commit" => Ok(HostCommand::Commit),
            "revert" => Ok(HostCommand::Revert),
            "refresh" => Ok(HostCommand::Refresh),
            "auto" => match args.next().map(str::to_ascii_lowercase).as_deref() {
                Some("on") => Ok(HostCommand::Auto(true)),
                Some("off") => Ok(HostCommand::Auto(false)),
                Some(other) => Err(CommandParseError::Unknown(format!("auto {other}"))),
                None => Err(CommandParseError::MissingArgument("on|off")),
            },
            "show" => Ok(HostCommand::Show),
            "status" => Ok(HostCommand::Status),
            "quit" | "exit" => Ok(HostCommand::Quit),
            other => Err(CommandParseError::Unknown(other.to_string())),
        }
    }
}

/// Drive the session hosted on `grid` from line commands until `quit` or
/// end of input. Session errors are printed and editing continues.
pub fn run_host<R: BufRead, W: Write>(
    registry: &mut SessionRegistry<EditSession>,
    grid: &mut MemoryGrid,
    input: R,
    mut out: W,
) -> Result<()> {
    let surface = grid.name().to_string();
    for line in input.lines() {
        let line = line.context("failed to read command")?;
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        let command = match line.parse::<HostCommand>() {
            Ok(command) => command,
            Err(err) => {
                writeln!(out, "error: {err}")?;
                continue;
            }
        };
        if command == HostCommand::Quit {
            break;
        }
        let session = registry
            .by_surface_mut(&surface)
            .ok_or_else(|| anyhow!("no edit session on {surface}"))?;
        if let Err(err) = dispatch(session, grid, command, &mut out) {
            warn!(error = %err, "command failed");
            writeln!(out, "error: {err}")?;
        }
    }
    Ok(())
}

fn dispatch<W: Write>(
    session: &mut EditSession,
    grid: &mut MemoryGrid,
    command: HostCommand,
    out: &mut W,
) -> Result<()> {
    match command {
        HostCommand::Set { cell, value } => {
            grid.set_value(cell, value);
            let outcome = session.on_region_changed(grid, &AddressRange::cell(cell))?;
            write_mutation(out, outcome, grid.color(cell))?;
        }
        HostCommand::DeleteRow { row, count } => {
            let target = grid.delete_rows(row, count);
            let outcome = session.on_region_changed(grid, &target)?;
            write_mutation(out, outcome, grid.color(target.start))?;
        }
        HostCommand::DeleteColumn { col, count } => {
            let target = grid.delete_columns(col, count);
            let outcome = session.on_region_changed(grid, &target)?;
            write_mutation(out, outcome, grid.color(target.start))?;
        }
        HostCommand::Select(range) => {
            let visible = session.on_selection_changed(grid, &range);
            writeln!(out, "{}", if visible { "session shown" } else { "session hidden" })?;
        }
        HostCommand::Commit => {
            if !session.commit_enabled() {
                writeln!(out, "nothing to commit")?;
            } else if let CommitOutcome::Suppressed(err) = session.commit(grid)? {
                writeln!(out, "commit skipped: {err}")?;
            }
        }
        HostCommand::Revert | HostCommand::Refresh => {
            if !session.revert_enabled() {
                writeln!(out, "revert is disabled while auto-commit is on")?;
            } else {
                session.revert(grid, command == HostCommand::Refresh)?;
                writeln!(out, "reverted")?;
            }
        }
        HostCommand::Auto(enabled) => {
            session.set_auto_commit(enabled);
            writeln!(out, "auto-commit {}", if enabled { "on" } else { "off" })?;
        }
        HostCommand::Show => grid.write_csv(&mut *out)?,
        HostCommand::Status => {
            let table = session.table();
            writeln!(
                out,
                "table {} {:?}: {} rows x {} columns at {}, {} pending region(s)",
                session.table_name(),
                session.state(),
                table.row_count(),
                table.column_count(),
                session.region(),
                session.ledger().len()
            )?;
        }
        HostCommand::Quit => {}
    }
    Ok(())
}

fn write_mutation<W: Write>(out: &mut W, outcome: MutationOutcome, color: RegionColor) -> Result<()> {
    match outcome {
        MutationOutcome::Ignored => writeln!(out, "outside edited region")?,
        MutationOutcome::Applied(kind) => writeln!(out, "{kind:?} {}", color.hex())?,
    }
    Ok(())
}
