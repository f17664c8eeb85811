use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::domain::entities::schema::{ColumnSchema, SchemaDescriptor};

pub fn open_connection(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create parent dir: {}", parent.display()))?;
    }
    let conn = Connection::open(db_path)
        .with_context(|| format!("failed to open db: {}", db_path.display()))?;
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign key enforcement")?;
    Ok(conn)
}

pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
            [table],
            |row| row.get(0),
        )
        .with_context(|| format!("failed to look up table {table}"))?;
    Ok(count > 0)
}

/// Read column names, declared types and primary-key membership in
/// declaration order.
pub fn load_table_schema(conn: &Connection, table: &str) -> Result<SchemaDescriptor> {
    let mut stmt = conn
        .prepare(
            "SELECT name, type, pk
             FROM pragma_table_info(?1)
             ORDER BY cid ASC",
        )
        .context("failed to prepare table info query")?;

    let columns = stmt
        .query_map([table], |row| {
            let name: String = row.get(0)?;
            let declared_type: String = row.get(1)?;
            let pk: i64 = row.get(2)?;
            Ok(ColumnSchema::new(name, declared_type, pk > 0))
        })
        .context("failed to query table info")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect table columns")?;

    Ok(SchemaDescriptor::new(table, columns))
}
