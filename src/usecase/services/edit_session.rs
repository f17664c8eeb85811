use tracing::{debug, info, warn};

use crate::config::{SessionConfig, SessionOptions};
use crate::domain::entities::address::{AddressRange, CellRef, Extent};
use crate::domain::entities::edit::{ChangeKind, RegionColor, SessionState};
use crate::domain::entities::schema::SchemaDescriptor;
use crate::domain::entities::table::BufferedTable;
use crate::usecase::ports::grid::GridSurface;
use crate::usecase::ports::notify::OutcomeSink;
use crate::usecase::ports::repo::{RepoError, TableRepository};
use crate::usecase::services::classifier::{classify_extents, to_table_coordinates};
use crate::usecase::services::dirty_ledger::DirtyLedger;
use crate::usecase::services::update_command::{
    build_update_command, select_statement, UpdateCommandTemplate,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("table `{table}` has no columns")]
    SchemaInvalid { table: String },
    #[error("table `{0}` was not found")]
    SchemaNotFound(String),
    #[error("could not load table: {0}")]
    Load(#[source] RepoError),
    #[error("query result does not match table `{table}`: {reason}")]
    QueryMismatch { table: String, reason: String },
    #[error("row {row} no longer matches its original values")]
    CommitConflict { rows_attempted: usize, row: usize },
    #[error("{message}")]
    CommitFailure {
        rows_attempted: usize,
        code: Option<i32>,
        message: String,
    },
    #[error("refresh failed: {0}")]
    RefreshFailure(String),
    #[error("cell {cell} is outside the edited table")]
    CellOutOfBounds { cell: CellRef },
}

impl SessionError {
    pub fn rows_attempted(&self) -> usize {
        match self {
            SessionError::CommitConflict { rows_attempted, .. }
            | SessionError::CommitFailure { rows_attempted, .. } => *rows_attempted,
            _ => 0,
        }
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            SessionError::CommitFailure { code, .. } => *code,
            SessionError::Load(err) => err.code(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The mutation did not touch the edited region.
    Ignored,
    Applied(ChangeKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed { rows: usize },
    /// Auto-commit failed; the error was logged and editing continues.
    Suppressed(SessionError),
}

/// One user editing one table region on one grid surface.
///
/// Owns the buffered table, the update template, the dirty ledger and the
/// repository (and with it the live connection). Mutation and selection
/// notifications must be delivered one at a time.
pub struct EditSession {
    schema: SchemaDescriptor,
    template: UpdateCommandTemplate,
    query: String,
    table: BufferedTable,
    ledger: DirtyLedger,
    options: SessionOptions,
    header_row: bool,
    region: AddressRange,
    last_extent: Extent,
    state: SessionState,
    commit_enabled: bool,
    visible: bool,
    repo: Box<dyn TableRepository>,
    sink: Box<dyn OutcomeSink>,
}

impl EditSession {
    /// Look up the schema, build the update template, fill the buffered
    /// table and draw it on `grid` at the configured anchor.
    pub fn start(
        config: SessionConfig,
        repo: Box<dyn TableRepository>,
        sink: Box<dyn OutcomeSink>,
        grid: &mut dyn GridSurface,
    ) -> Result<Self, SessionError> {
        let schema = repo
            .table_schema(&config.table_name)
            .map_err(|err| match err {
                RepoError::TableNotFound(table) => SessionError::SchemaNotFound(table),
                other => SessionError::Load(other),
            })?;
        let template = build_update_command(&schema).map_err(|_| SessionError::SchemaInvalid {
            table: schema.table.clone(),
        })?;

        let query = config
            .query
            .clone()
            .unwrap_or_else(|| select_statement(&schema, config.filter.as_deref()));
        let data = repo.fill_from_query(&query).map_err(SessionError::Load)?;
        let table = BufferedTable::load(&schema, &data.columns, data.rows).map_err(|err| {
            SessionError::QueryMismatch {
                table: schema.table.clone(),
                reason: err.to_string(),
            }
        })?;

        let header_row = config.options.header_row;
        grid.redraw(&table, header_row, config.anchor);
        let region = drawn_region(config.anchor, &table, header_row);
        let last_extent = grid.used_extent();

        info!(
            table = %schema.table,
            rows = table.row_count(),
            region = %region,
            auto_commit = config.options.auto_commit,
            "edit session started"
        );

        Ok(EditSession {
            schema,
            template,
            query,
            table,
            ledger: DirtyLedger::new(),
            options: config.options,
            header_row,
            region,
            last_extent,
            state: SessionState::Clean,
            commit_enabled: false,
            visible: true,
            repo,
            sink,
        })
    }

    pub fn table_name(&self) -> &str {
        &self.schema.table
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    pub fn template(&self) -> &UpdateCommandTemplate {
        &self.template
    }

    pub fn table(&self) -> &BufferedTable {
        &self.table
    }

    pub fn ledger(&self) -> &DirtyLedger {
        &self.ledger
    }

    pub fn region(&self) -> AddressRange {
        self.region
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn header_row(&self) -> bool {
        self.header_row
    }

    pub fn auto_commit(&self) -> bool {
        self.options.auto_commit
    }

    pub fn commit_enabled(&self) -> bool {
        self.commit_enabled
    }

    pub fn revert_enabled(&self) -> bool {
        !self.options.auto_commit
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_auto_commit(&mut self, enabled: bool) {
        self.options.auto_commit = enabled;
        self.commit_enabled = !enabled && !self.ledger.is_empty();
        info!(table = %self.schema.table, enabled, "auto-commit toggled");
    }

    /// Handle a change notification for `target` on the grid surface.
    pub fn on_region_changed(
        &mut self,
        grid: &mut dyn GridSurface,
        target: &AddressRange,
    ) -> Result<MutationOutcome, SessionError> {
        let Some(hit) = grid.intersect(&self.region, target) else {
            return Ok(MutationOutcome::Ignored);
        };

        let current = grid.used_extent();
        let previous = self.last_extent;
        let kind = classify_extents(previous, current);

        let grid_row = hit.start.row - self.region.start.row + 1;
        let grid_col = hit.start.col - self.region.start.col + 1;
        let (table_row, table_col) = to_table_coordinates(grid_row, grid_col, self.header_row);
        debug!(range = %hit, ?kind, table_row, table_col, "grid mutation");

        if kind == ChangeKind::CellEdit {
            self.check_bounds(&hit, table_row, table_col)?;
        }

        let auto_commit = self.options.auto_commit;
        if !auto_commit {
            self.ledger.record(hit);
        }
        let color = if auto_commit {
            RegionColor::Committed
        } else {
            RegionColor::Uncommitted
        };
        grid.set_region_color(&hit, color);
        self.last_extent = current;

        let touched = match kind {
            ChangeKind::RowDeleted => {
                self.delete_rows(&hit, previous.rows - current.rows, table_row);
                Vec::new()
            }
            ChangeKind::ColumnDeleted => {
                self.delete_columns(&hit, previous.cols - current.cols, table_col);
                Vec::new()
            }
            ChangeKind::CellEdit => self.apply_cell_edit(grid, &hit, table_row, table_col),
        };

        self.state = SessionState::Dirty;
        self.commit_enabled = !auto_commit;
        if auto_commit {
            self.commit_rows(grid, touched)?;
        }
        Ok(MutationOutcome::Applied(kind))
    }

    /// Track whether the grid selection still touches the edited region.
    pub fn on_selection_changed(&mut self, grid: &dyn GridSurface, target: &AddressRange) -> bool {
        self.visible = grid.intersect(&self.region, target).is_some();
        self.visible
    }

    fn delete_rows(&mut self, hit: &AddressRange, shrink: usize, table_row: i64) {
        let within_region = shrink.min(hit.row_count());
        let mut count = within_region;
        let mut start = table_row;
        if start < 0 {
            info!(table = %self.schema.table, "header row deleted");
            self.header_row = false;
            count -= 1;
            start = 0;
        }
        let removed = self.table.remove_rows(start as usize, count);
        self.region = self.region.shrink_rows(within_region);
        debug!(start, removed, rows = self.table.row_count(), "rows deleted");
    }

    fn delete_columns(&mut self, hit: &AddressRange, shrink: usize, table_col: i64) {
        let count = shrink.min(hit.col_count());
        let removed = self.table.remove_columns(table_col.max(0) as usize, count);
        self.region = self.region.shrink_cols(count);
        debug!(start = table_col, removed, cols = self.table.column_count(), "columns deleted");
    }

    fn check_bounds(
        &self,
        hit: &AddressRange,
        table_row: i64,
        table_col: i64,
    ) -> Result<(), SessionError> {
        let rows = hit.row_count();
        let first_data = usize::from(table_row < 0);
        let data_row = table_row.max(0) as usize;
        let col = table_col.max(0) as usize;

        if col + hit.col_count() > self.table.column_count()
            || (rows > first_data && data_row + (rows - first_data) > self.table.row_count())
        {
            return Err(SessionError::CellOutOfBounds { cell: hit.end });
        }
        Ok(())
    }

    /// Copy the hit's grid values into the buffered table. Returns the data
    /// rows written.
    fn apply_cell_edit(
        &mut self,
        grid: &dyn GridSurface,
        hit: &AddressRange,
        table_row: i64,
        table_col: i64,
    ) -> Vec<usize> {
        let rows = hit.row_count();
        let cols = hit.col_count();
        let header_hit = table_row < 0;
        let first_data = usize::from(header_hit);
        let data_row = table_row.max(0) as usize;
        let col = table_col.max(0) as usize;

        let values = grid.values(hit);
        if header_hit {
            for c in 0..cols {
                let name = values
                    .first()
                    .and_then(|row| row.get(c))
                    .map(ToString::to_string)
                    .unwrap_or_default();
                if name.trim().is_empty() {
                    warn!(column = col + c, "ignoring blank column name");
                    continue;
                }
                self.table.rename_column(col + c, &name);
            }
        }
        for r in first_data..rows {
            for c in 0..cols {
                let value = values
                    .get(r)
                    .and_then(|row| row.get(c))
                    .cloned()
                    .unwrap_or_default();
                self.table.set_value(data_row + r - first_data, col + c, value);
            }
        }
        (data_row..data_row + rows.saturating_sub(first_data)).collect()
    }

    /// Push every changed row through the update template.
    ///
    /// Manual mode reports the outcome to the sink and keeps the session dirty
    /// on failure. Auto-commit mode only logs failures.
    pub fn commit(&mut self, grid: &mut dyn GridSurface) -> Result<CommitOutcome, SessionError> {
        let changed = self.table.changed_rows();
        self.commit_rows(grid, changed)
    }

    /// Commit only `rows`. Auto-commit passes the rows of the current
    /// mutation so an earlier conflicted row is not retried with it.
    fn commit_rows(
        &mut self,
        grid: &mut dyn GridSurface,
        rows: Vec<usize>,
    ) -> Result<CommitOutcome, SessionError> {
        match self.push_changes(rows) {
            Ok(rows) => {
                for range in self.ledger.drain() {
                    grid.set_region_color(&range, RegionColor::Committed);
                }
                self.state = SessionState::Clean;
                self.commit_enabled = false;
                info!(table = %self.schema.table, rows, "changes committed");

                if !self.options.auto_commit {
                    let summary = format!(
                        "Edited data for table {} was committed successfully.",
                        self.schema.table
                    );
                    let details = format!(
                        "Updating data rows...\n\n{}\n\n{rows} rows have been updated successfully.",
                        self.template.sql()
                    );
                    self.sink.report_outcome(true, &summary, &details);
                }
                Ok(CommitOutcome::Committed { rows })
            }
            Err(err) if self.options.auto_commit => {
                warn!(table = %self.schema.table, error = %err, "auto-commit failed");
                Ok(CommitOutcome::Suppressed(err))
            }
            Err(err) => {
                let summary = format!(
                    "Edited data for table {} could not be committed.",
                    self.schema.table
                );
                let code = err.code().map(|code| format!(" {code}")).unwrap_or_default();
                let details = format!(
                    "Updating data rows...\n\n{}\n\n{} rows were attempted.\nError{code}:\n{err}",
                    self.template.sql(),
                    err.rows_attempted()
                );
                self.sink.report_outcome(false, &summary, &details);
                Err(err)
            }
        }
    }

    fn push_changes(&mut self, rows: Vec<usize>) -> Result<usize, SessionError> {
        let changed: Vec<usize> = rows
            .into_iter()
            .filter(|&row| self.table.is_row_changed(row))
            .collect();
        let attempted = changed.len();
        if attempted == 0 {
            return Ok(0);
        }
        if !self.template.is_writable() {
            debug!(table = %self.schema.table, "only key columns, nothing to update");
            self.table.accept_rows(&changed);
            return Ok(0);
        }

        let failure = |err: RepoError| SessionError::CommitFailure {
            rows_attempted: attempted,
            code: err.code(),
            message: err.to_string(),
        };

        self.repo.begin().map_err(failure)?;
        for &row in &changed {
            let Some(image) = self.table.row_image(row) else {
                continue;
            };
            let result = self.repo.execute_update(&self.template, image);
            let err = match result {
                Ok(0) => SessionError::CommitConflict {
                    rows_attempted: attempted,
                    row,
                },
                Ok(_) => continue,
                Err(err) => failure(err),
            };
            if let Err(rollback) = self.repo.finish(false) {
                warn!(error = %rollback, "rollback failed");
            }
            return Err(err);
        }
        if let Err(err) = self.repo.finish(true) {
            if let Err(rollback) = self.repo.finish(false) {
                warn!(error = %rollback, "rollback after failed commit failed");
            }
            return Err(failure(err));
        }

        self.table.accept_rows(&changed);
        Ok(attempted)
    }

    /// Discard pending edits, optionally re-reading the rows from the source,
    /// and redraw the table on the grid.
    pub fn revert(
        &mut self,
        grid: &mut dyn GridSurface,
        refresh_from_source: bool,
    ) -> Result<(), SessionError> {
        if refresh_from_source {
            let data = self
                .repo
                .fill_from_query(&self.query)
                .map_err(|err| SessionError::RefreshFailure(err.to_string()))?;
            self.table = BufferedTable::load(&self.schema, &data.columns, data.rows)
                .map_err(|err| SessionError::RefreshFailure(err.to_string()))?;
        } else {
            self.table.reject_changes();
        }

        let anchor = self.region.start;
        grid.clear_region(&self.region);
        grid.redraw(&self.table, self.header_row, anchor);
        self.region = drawn_region(anchor, &self.table, self.header_row);
        grid.set_region_color(&self.region, RegionColor::Default);
        self.last_extent = grid.used_extent();

        self.ledger.clear();
        self.state = SessionState::Clean;
        self.commit_enabled = false;
        info!(
            table = %self.schema.table,
            refresh_from_source,
            rows = self.table.row_count(),
            "changes reverted"
        );
        Ok(())
    }

    /// End the session, releasing the repository and its connection.
    pub fn close(self) {
        if self.table.has_changes() {
            warn!(table = %self.schema.table, "closing with uncommitted changes");
        }
        info!(table = %self.schema.table, "edit session closed");
    }
}

fn drawn_region(anchor: CellRef, table: &BufferedTable, header_row: bool) -> AddressRange {
    AddressRange::with_size(
        anchor,
        table.row_count() + usize::from(header_row),
        table.column_count(),
    )
}
