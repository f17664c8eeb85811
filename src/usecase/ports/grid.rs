use crate::domain::entities::address::{AddressRange, CellRef, Extent};
use crate::domain::entities::edit::RegionColor;
use crate::domain::entities::table::BufferedTable;
use crate::domain::entities::value::CellValue;

/// The live spreadsheet surface an edit session observes.
///
/// The host calls the session whenever a region changes; the session calls
/// back through this trait to read values and paint feedback.
pub trait GridSurface {
    /// Rows and columns currently in use on the surface.
    fn used_extent(&self) -> Extent;

    fn intersect(&self, a: &AddressRange, b: &AddressRange) -> Option<AddressRange> {
        a.intersect(b)
    }

    /// Current values of `range`, row-major, sized exactly to the range.
    fn values(&self, range: &AddressRange) -> Vec<Vec<CellValue>>;

    fn set_region_color(&mut self, range: &AddressRange, color: RegionColor);

    fn clear_region(&mut self, range: &AddressRange);

    /// Write the table at `at`, preceded by a header row when `header_row`.
    fn redraw(&mut self, table: &BufferedTable, header_row: bool, at: CellRef);
}
