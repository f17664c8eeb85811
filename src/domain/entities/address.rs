use std::fmt;
use std::str::FromStr;

/// A single grid cell in 1-based row/column addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub fn new(row: usize, col: usize) -> Self {
        CellRef { row, col }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", col_to_letters(self.col), self.row)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressParseError {
    #[error("empty address")]
    Empty,
    #[error("invalid cell reference: {0}")]
    InvalidCell(String),
}

impl FromStr for CellRef {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AddressParseError::Empty);
        }
        let invalid = || AddressParseError::InvalidCell(trimmed.to_string());

        let mut letters = String::new();
        let mut digits = String::new();
        for c in trimmed.chars().filter(|c| *c != '$') {
            if c.is_ascii_alphabetic() && digits.is_empty() {
                letters.push(c.to_ascii_uppercase());
            } else if c.is_ascii_digit() {
                digits.push(c);
            } else {
                return Err(invalid());
            }
        }

        let col = letters_to_col(&letters).ok_or_else(invalid)?;
        let row: usize = digits.parse().map_err(|_| invalid())?;
        if row == 0 {
            return Err(invalid());
        }
        Ok(CellRef { row, col })
    }
}

/// Convert a 1-based column number to its letter form (1 = A, 27 = AA).
pub fn col_to_letters(col: usize) -> String {
    let mut result = String::new();
    let mut n = col.max(1) - 1;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// Convert column letters to a 1-based column number.
pub fn letters_to_col(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut col: usize = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() as usize) - ('A' as usize) + 1;
        col = col.checked_mul(26)?.checked_add(digit)?;
    }
    Some(col)
}

/// Rectangular grid region, always stored with `start` at the top-left.
///
/// Equality is structural, so two ranges are equal exactly when their
/// textual addresses are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AddressRange {
    pub start: CellRef,
    pub end: CellRef,
}

impl AddressRange {
    pub fn new(a: CellRef, b: CellRef) -> Self {
        AddressRange {
            start: CellRef::new(a.row.min(b.row), a.col.min(b.col)),
            end: CellRef::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    pub fn cell(cell: CellRef) -> Self {
        AddressRange {
            start: cell,
            end: cell,
        }
    }

    /// Range anchored at `start` spanning `rows` x `cols` cells. Both sizes are
    /// clamped to at least one.
    pub fn with_size(start: CellRef, rows: usize, cols: usize) -> Self {
        AddressRange {
            start,
            end: CellRef::new(start.row + rows.max(1) - 1, start.col + cols.max(1) - 1),
        }
    }

    pub fn row_count(&self) -> usize {
        self.end.row - self.start.row + 1
    }

    pub fn col_count(&self) -> usize {
        self.end.col - self.start.col + 1
    }

    pub fn cell_count(&self) -> usize {
        self.row_count() * self.col_count()
    }

    pub fn is_single_cell(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, cell: CellRef) -> bool {
        (self.start.row..=self.end.row).contains(&cell.row)
            && (self.start.col..=self.end.col).contains(&cell.col)
    }

    pub fn intersect(&self, other: &AddressRange) -> Option<AddressRange> {
        let top = self.start.row.max(other.start.row);
        let left = self.start.col.max(other.start.col);
        let bottom = self.end.row.min(other.end.row);
        let right = self.end.col.min(other.end.col);
        if top > bottom || left > right {
            return None;
        }
        Some(AddressRange {
            start: CellRef::new(top, left),
            end: CellRef::new(bottom, right),
        })
    }

    /// Drop `rows` rows from the bottom edge, keeping at least one row.
    pub fn shrink_rows(&self, rows: usize) -> AddressRange {
        let keep = self.row_count().saturating_sub(rows).max(1);
        AddressRange::with_size(self.start, keep, self.col_count())
    }

    /// Drop `cols` columns from the right edge, keeping at least one column.
    pub fn shrink_cols(&self, cols: usize) -> AddressRange {
        let keep = self.col_count().saturating_sub(cols).max(1);
        AddressRange::with_size(self.start, self.row_count(), keep)
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_cell() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

impl FromStr for AddressRange {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((start, end)) => Ok(AddressRange::new(start.parse()?, end.parse()?)),
            None => Ok(AddressRange::cell(s.parse()?)),
        }
    }
}

/// Used extent of a grid surface, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent {
    pub rows: usize,
    pub cols: usize,
}

impl Extent {
    pub fn new(rows: usize, cols: usize) -> Self {
        Extent { rows, cols }
    }
}
