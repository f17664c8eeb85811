use crate::domain::entities::schema::SchemaDescriptor;
use crate::domain::entities::value::CellValue;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableShapeError {
    #[error("query result is missing column `{0}`")]
    MissingColumn(String),
    #[error("row {row} has {found} values, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
}

/// A visible column of the buffered table.
///
/// `source` points into the schema-ordered storage of every row; the display
/// name can diverge from the source column after a header rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferedColumn {
    pub name: String,
    original_name: String,
    source: usize,
}

impl BufferedColumn {
    pub fn source(&self) -> usize {
        self.source
    }

    pub fn is_renamed(&self) -> bool {
        self.name != self.original_name
    }
}

#[derive(Debug, Clone, PartialEq)]
struct BufferedRow {
    original: Vec<CellValue>,
    current: Vec<CellValue>,
}

impl BufferedRow {
    fn is_changed(&self) -> bool {
        self.original != self.current
    }
}

/// Original and current values of one row, in schema column order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowImage<'a> {
    pub original: &'a [CellValue],
    pub current: &'a [CellValue],
}

/// In-memory mirror of the rows being edited.
///
/// Rows keep a value for every schema column even after a column has been
/// removed from the view, so updates can still bind the hidden value.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferedTable {
    name: String,
    columns: Vec<BufferedColumn>,
    rows: Vec<BufferedRow>,
}

impl BufferedTable {
    /// Build a table from a query result, matching result columns to schema
    /// columns by name. Result columns unknown to the schema are ignored.
    pub fn load(
        schema: &SchemaDescriptor,
        result_columns: &[String],
        result_rows: Vec<Vec<CellValue>>,
    ) -> Result<Self, TableShapeError> {
        let mut columns = Vec::with_capacity(schema.columns.len());
        let mut result_index = vec![None; schema.columns.len()];
        for (idx, name) in result_columns.iter().enumerate() {
            let Some(source) = schema.position(name) else {
                continue;
            };
            if result_index[source].is_some() {
                continue;
            }
            result_index[source] = Some(idx);
            columns.push(BufferedColumn {
                name: name.clone(),
                original_name: name.clone(),
                source,
            });
        }

        let result_index = result_index
            .into_iter()
            .zip(&schema.columns)
            .map(|(idx, column)| idx.ok_or_else(|| TableShapeError::MissingColumn(column.name.clone())))
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows = Vec::with_capacity(result_rows.len());
        for (row_idx, mut row) in result_rows.into_iter().enumerate() {
            if row.len() < result_columns.len() {
                return Err(TableShapeError::RaggedRow {
                    row: row_idx,
                    found: row.len(),
                    expected: result_columns.len(),
                });
            }
            let values: Vec<CellValue> = result_index
                .iter()
                .map(|&idx| std::mem::take(&mut row[idx]))
                .collect();
            rows.push(BufferedRow {
                original: values.clone(),
                current: values,
            });
        }

        Ok(BufferedTable {
            name: schema.table.clone(),
            columns,
            rows,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[BufferedColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|column| column.name.clone()).collect()
    }

    pub fn value(&self, row: usize, col: usize) -> Option<&CellValue> {
        let source = self.columns.get(col)?.source;
        self.rows.get(row).map(|r| &r.current[source])
    }

    pub fn original_value(&self, row: usize, col: usize) -> Option<&CellValue> {
        let source = self.columns.get(col)?.source;
        self.rows.get(row).map(|r| &r.original[source])
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.rows.len() && col < self.columns.len()
    }

    /// Overwrite the current value of a visible cell. Returns `false` when the
    /// coordinates fall outside the table.
    pub fn set_value(&mut self, row: usize, col: usize, value: CellValue) -> bool {
        let Some(source) = self.columns.get(col).map(|c| c.source) else {
            return false;
        };
        match self.rows.get_mut(row) {
            Some(r) => {
                r.current[source] = value;
                true
            }
            None => false,
        }
    }

    pub fn rename_column(&mut self, col: usize, name: &str) -> bool {
        match self.columns.get_mut(col) {
            Some(column) => {
                column.name = name.to_string();
                true
            }
            None => false,
        }
    }

    /// Remove `count` rows starting at `start`, clamped to the rows present.
    /// Returns how many rows were removed.
    pub fn remove_rows(&mut self, start: usize, count: usize) -> usize {
        if start >= self.rows.len() {
            return 0;
        }
        let end = (start + count).min(self.rows.len());
        self.rows.drain(start..end).count()
    }

    /// Remove `count` columns from the view starting at `start`.
    pub fn remove_columns(&mut self, start: usize, count: usize) -> usize {
        if start >= self.columns.len() {
            return 0;
        }
        let end = (start + count).min(self.columns.len());
        self.columns.drain(start..end).count()
    }

    pub fn is_row_changed(&self, row: usize) -> bool {
        self.rows.get(row).is_some_and(BufferedRow::is_changed)
    }

    pub fn changed_rows(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.is_changed())
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn has_changes(&self) -> bool {
        self.rows.iter().any(BufferedRow::is_changed)
    }

    pub fn row_image(&self, row: usize) -> Option<RowImage<'_>> {
        self.rows.get(row).map(|r| RowImage {
            original: &r.original,
            current: &r.current,
        })
    }

    /// Make the current values of `rows` the new baseline for concurrency
    /// checks. Other rows keep their pending edits.
    pub fn accept_rows(&mut self, rows: &[usize]) {
        for &idx in rows {
            if let Some(row) = self.rows.get_mut(idx) {
                row.original = row.current.clone();
            }
        }
    }

    /// Roll every remaining row and renamed header back to its original state.
    pub fn reject_changes(&mut self) {
        for row in &mut self.rows {
            if row.is_changed() {
                row.current = row.original.clone();
            }
        }
        for column in &mut self.columns {
            column.name = column.original_name.clone();
        }
    }

    /// Visible rows in display column order.
    pub fn display_rows(&self) -> Vec<Vec<CellValue>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .map(|column| row.current[column.source].clone())
                    .collect()
            })
            .collect()
    }
}
