use std::io::Write;

use anyhow::{Context, Result};

use crate::domain::entities::address::{AddressRange, CellRef, Extent};
use crate::domain::entities::edit::RegionColor;
use crate::domain::entities::table::BufferedTable;
use crate::domain::entities::value::CellValue;
use crate::usecase::ports::grid::GridSurface;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridCell {
    pub value: CellValue,
    pub color: RegionColor,
}

/// Dense in-memory sheet anchored at A1.
///
/// The used extent is the stored area: writing past it grows the sheet,
/// deleting rows or columns shrinks it. Colors only apply to stored cells.
#[derive(Debug, Clone, Default)]
pub struct MemoryGrid {
    name: String,
    rows: Vec<Vec<GridCell>>,
}

impl MemoryGrid {
    pub fn new(name: impl Into<String>) -> Self {
        MemoryGrid {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn cell(&self, cell: CellRef) -> Option<&GridCell> {
        self.rows.get(cell.row.checked_sub(1)?)?.get(cell.col.checked_sub(1)?)
    }

    fn existing_cell_mut(&mut self, cell: CellRef) -> Option<&mut GridCell> {
        self.rows
            .get_mut(cell.row.checked_sub(1)?)?
            .get_mut(cell.col.checked_sub(1)?)
    }

    fn cell_mut(&mut self, cell: CellRef) -> &mut GridCell {
        let (row, col) = (cell.row.max(1) - 1, cell.col.max(1) - 1);
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize_with(col + 1, GridCell::default);
        }
        &mut cells[col]
    }

    pub fn value(&self, cell: CellRef) -> CellValue {
        self.cell(cell).map(|c| c.value.clone()).unwrap_or_default()
    }

    pub fn color(&self, cell: CellRef) -> RegionColor {
        self.cell(cell).map(|c| c.color).unwrap_or_default()
    }

    pub fn set_value(&mut self, cell: CellRef, value: CellValue) {
        self.cell_mut(cell).value = value;
    }

    /// Delete `count` whole rows starting at `first`, shifting rows below up.
    /// Returns the address of the affected rows for the change notification.
    pub fn delete_rows(&mut self, first: usize, count: usize) -> AddressRange {
        let target = AddressRange::with_size(
            CellRef::new(first.max(1), 1),
            count,
            self.used_extent().cols,
        );
        let start = (first.max(1) - 1).min(self.rows.len());
        let end = (start + count).min(self.rows.len());
        self.rows.drain(start..end);
        target
    }

    /// Delete `count` whole columns starting at `first`, shifting columns left.
    pub fn delete_columns(&mut self, first: usize, count: usize) -> AddressRange {
        let target = AddressRange::with_size(
            CellRef::new(1, first.max(1)),
            self.used_extent().rows,
            count,
        );
        let start = first.max(1) - 1;
        for cells in &mut self.rows {
            let from = start.min(cells.len());
            let to = (start + count).min(cells.len());
            cells.drain(from..to);
        }
        target
    }

    /// Write the used area as CSV, one record per row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let extent = self.used_extent();
        let mut csv_writer = csv::WriterBuilder::new()
            .flexible(false)
            .from_writer(writer);
        for row in 1..=extent.rows {
            let record: Vec<String> = (1..=extent.cols)
                .map(|col| self.value(CellRef::new(row, col)).to_string())
                .collect();
            csv_writer
                .write_record(&record)
                .context("failed to write grid row")?;
        }
        csv_writer.flush().context("failed to flush grid csv")?;
        Ok(())
    }
}

impl GridSurface for MemoryGrid {
    fn used_extent(&self) -> Extent {
        let cols = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        Extent::new(self.rows.len(), cols)
    }

    fn values(&self, range: &AddressRange) -> Vec<Vec<CellValue>> {
        (range.start.row..=range.end.row)
            .map(|row| {
                (range.start.col..=range.end.col)
                    .map(|col| self.value(CellRef::new(row, col)))
                    .collect()
            })
            .collect()
    }

    fn set_region_color(&mut self, range: &AddressRange, color: RegionColor) {
        for row in range.start.row..=range.end.row {
            for col in range.start.col..=range.end.col {
                if let Some(cell) = self.existing_cell_mut(CellRef::new(row, col)) {
                    cell.color = color;
                }
            }
        }
    }

    fn clear_region(&mut self, range: &AddressRange) {
        for row in range.start.row..=range.end.row {
            for col in range.start.col..=range.end.col {
                if let Some(cell) = self.existing_cell_mut(CellRef::new(row, col)) {
                    *cell = GridCell::default();
                }
            }
        }
    }

    fn redraw(&mut self, table: &BufferedTable, header_row: bool, at: CellRef) {
        let mut row = at.row;
        if header_row {
            for (offset, name) in table.column_names().into_iter().enumerate() {
                self.set_value(CellRef::new(row, at.col + offset), CellValue::Text(name));
            }
            row += 1;
        }
        for values in table.display_rows() {
            for (offset, value) in values.into_iter().enumerate() {
                self.set_value(CellRef::new(row, at.col + offset), value);
            }
            row += 1;
        }
    }
}
