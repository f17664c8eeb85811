/// What a single grid mutation notification turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    CellEdit,
    RowDeleted,
    ColumnDeleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Clean,
    Dirty,
}

/// Background color applied to grid regions as edit feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RegionColor {
    #[default]
    Default,
    Committed,
    Uncommitted,
}

impl RegionColor {
    pub fn hex(self) -> &'static str {
        match self {
            RegionColor::Default => "#FFFFFF",
            RegionColor::Committed => "#B8E5F7",
            RegionColor::Uncommitted => "#FF8282",
        }
    }
}
