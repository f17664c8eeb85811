use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use gridedit::cli::{run_host, Cli};
use gridedit::config::default_db_path;
use gridedit::infra::console::ConsoleSink;
use gridedit::infra::grid::memory::MemoryGrid;
use gridedit::infra::sqlite::repo::SqliteRepo;
use gridedit::usecase::services::edit_session::EditSession;
use gridedit::usecase::services::session_registry::SessionRegistry;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    let db_path = match &cli.db {
        Some(path) => path.clone(),
        None => default_db_path()?,
    };
    info!(db = %db_path.display(), table = %cli.table, "gridedit starting");

    let repo = SqliteRepo::open(&db_path)?;
    let mut grid = MemoryGrid::new("Sheet1");
    let session = EditSession::start(
        cli.session_config(),
        Box::new(repo),
        Box::new(ConsoleSink::default()),
        &mut grid,
    )
    .with_context(|| format!("failed to start editing table {}", cli.table))?;

    let mut registry = SessionRegistry::new();
    registry.open(&cli.table, grid.name(), session)?;

    let stdin = io::stdin();
    run_host(&mut registry, &mut grid, stdin.lock(), io::stdout().lock())?;

    if let Some(session) = registry.close_surface(grid.name()) {
        session.close();
    }
    Ok(())
}
