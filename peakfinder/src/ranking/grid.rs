//! Grid-based candidate simplification.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::peak::Peak;

/// Reduce a dense point set to one representative per spatial cell.
///
/// Peaks are bucketed by `floor(lat/cell), floor(lon/cell)` and only
/// the highest-elevation member of each cell survives. A peak with
/// unknown elevation is kept only when no elevation-bearing peak
/// occupies its cell. Used to bound aggregator work on very large
/// searches at the cost of losing non-maximal peaks within a cell.
pub fn simplify_by_grid(peaks: Vec<Peak>, cell_deg: f64) -> Vec<Peak> {
    let mut cells: HashMap<(i64, i64), Peak> = HashMap::new();

    for peak in peaks {
        let key = (
            (peak.location.lat / cell_deg).floor() as i64,
            (peak.location.lon / cell_deg).floor() as i64,
        );
        match cells.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(peak);
            }
            Entry::Occupied(mut slot) => {
                if peak.comparison_elevation() > slot.get().comparison_elevation() {
                    slot.insert(peak);
                }
            }
        }
    }

    cells.into_values().collect()
}
