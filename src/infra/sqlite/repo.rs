use std::path::Path;

use rusqlite::Connection;

use crate::domain::entities::schema::SchemaDescriptor;
use crate::domain::entities::table::RowImage;
use crate::infra::sqlite::queries::{execute_update, fill_from_query};
use crate::infra::sqlite::schema::{load_table_schema, open_connection, table_exists};
use crate::usecase::ports::repo::{RepoError, TableRepository, TabularData};
use crate::usecase::services::update_command::UpdateCommandTemplate;

/// SQLite data layer holding one connection for the life of a session.
pub struct SqliteRepo {
    conn: Connection,
}

impl SqliteRepo {
    pub fn open(db_path: &Path) -> anyhow::Result<Self> {
        Ok(SqliteRepo {
            conn: open_connection(db_path)?,
        })
    }

    pub fn from_connection(conn: Connection) -> Self {
        SqliteRepo { conn }
    }
}

fn sqlite_error(err: &rusqlite::Error) -> RepoError {
    let code = match err {
        rusqlite::Error::SqliteFailure(ffi_err, _) => Some(ffi_err.extended_code),
        _ => None,
    };
    RepoError::Database {
        code,
        message: err.to_string(),
    }
}

fn anyhow_error(err: anyhow::Error) -> RepoError {
    match err.downcast_ref::<rusqlite::Error>() {
        Some(sqlite) => RepoError::Database {
            code: match sqlite {
                rusqlite::Error::SqliteFailure(ffi_err, _) => Some(ffi_err.extended_code),
                _ => None,
            },
            message: format!("{err:#}"),
        },
        None => RepoError::Message(format!("{err:#}")),
    }
}

impl TableRepository for SqliteRepo {
    fn table_schema(&self, table: &str) -> Result<SchemaDescriptor, RepoError> {
        if !table_exists(&self.conn, table).map_err(anyhow_error)? {
            return Err(RepoError::TableNotFound(table.to_string()));
        }
        load_table_schema(&self.conn, table).map_err(anyhow_error)
    }

    fn fill_from_query(&self, query: &str) -> Result<TabularData, RepoError> {
        fill_from_query(&self.conn, query).map_err(anyhow_error)
    }

    fn begin(&mut self) -> Result<(), RepoError> {
        self.conn
            .execute_batch("BEGIN")
            .map_err(|err| sqlite_error(&err))
    }

    fn execute_update(
        &mut self,
        template: &UpdateCommandTemplate,
        row: RowImage<'_>,
    ) -> Result<usize, RepoError> {
        execute_update(&self.conn, template, row).map_err(|err| sqlite_error(&err))
    }

    fn finish(&mut self, commit: bool) -> Result<(), RepoError> {
        let sql = if commit { "COMMIT" } else { "ROLLBACK" };
        self.conn
            .execute_batch(sql)
            .map_err(|err| sqlite_error(&err))
    }
}
