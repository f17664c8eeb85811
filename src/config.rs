use std::path::PathBuf;

use anyhow::{anyhow, Result};
use directories::ProjectDirs;

use crate::domain::entities::address::CellRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Commit every classified edit immediately, suppressing failures.
    pub auto_commit: bool,
    /// The first grid row of the region holds column names.
    pub header_row: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        SessionOptions {
            auto_commit: false,
            header_row: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub table_name: String,
    /// Query that fills the buffered table. When absent every schema column
    /// of `table_name` is selected, narrowed by `filter`.
    pub query: Option<String>,
    pub filter: Option<String>,
    /// Top-left grid cell the table is drawn at.
    pub anchor: CellRef,
    pub options: SessionOptions,
}

impl SessionConfig {
    pub fn new(table_name: impl Into<String>) -> Self {
        SessionConfig {
            table_name: table_name.into(),
            query: None,
            filter: None,
            anchor: CellRef::new(1, 1),
            options: SessionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_anchor(mut self, anchor: CellRef) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("com", "hellhbbd", "gridedit")
        .ok_or_else(|| anyhow!("unable to resolve data directory"))?;
    Ok(project_dirs.data_local_dir().join("gridedit.sqlite"))
}
