use crate::domain::entities::address::Extent;
use crate::domain::entities::edit::ChangeKind;

/// Classify a mutation from the grid extent before and after it.
///
/// Checks run in order and the first match wins: a row shrink is reported as
/// a row deletion even when the column count shrank in the same notification.
pub fn classify(prev_rows: usize, prev_cols: usize, curr_rows: usize, curr_cols: usize) -> ChangeKind {
    if curr_rows < prev_rows {
        ChangeKind::RowDeleted
    } else if curr_cols < prev_cols {
        ChangeKind::ColumnDeleted
    } else {
        ChangeKind::CellEdit
    }
}

pub fn classify_extents(prev: Extent, curr: Extent) -> ChangeKind {
    classify(prev.rows, prev.cols, curr.rows, curr.cols)
}

/// Map 1-based grid coordinates to 0-based table coordinates.
///
/// A negative row means the coordinate is on the header row.
pub fn to_table_coordinates(grid_row: usize, grid_col: usize, header_row: bool) -> (i64, i64) {
    let row_offset = if header_row { 2 } else { 1 };
    (grid_row as i64 - row_offset, grid_col as i64 - 1)
}

/// Inverse of [`to_table_coordinates`].
pub fn to_grid_coordinates(table_row: i64, table_col: i64, header_row: bool) -> (usize, usize) {
    let row_offset = if header_row { 2 } else { 1 };
    ((table_row + row_offset).max(1) as usize, (table_col + 1).max(1) as usize)
}
