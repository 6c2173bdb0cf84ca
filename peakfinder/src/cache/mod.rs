//! Tile result cache.
//!
//! Memoizes bounding-box query results keyed by tile bounds so a
//! re-run search skips redundant network cost. Entries are reused
//! while younger than the staleness window and simply overwritten on
//! refetch; nothing is ever evicted, which is acceptable because tile
//! sets per session are small and the cache lives only as long as the
//! orchestrator that owns it.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::geo::Tile;
use crate::peak::Peak;

/// Default staleness window: 10 minutes.
pub const DEFAULT_STALENESS_WINDOW: Duration = Duration::from_secs(10 * 60);

/// Decimal places used when rounding tile bounds into a cache key, so
/// repeated runs over the same circle hit the cache.
const KEY_PRECISION: usize = 4;

/// Entry in the tile cache.
#[derive(Debug, Clone)]
struct CacheEntry {
    /// When the tile was fetched.
    fetched_at: Instant,
    /// Peaks returned for the tile.
    peaks: Vec<Peak>,
}

/// Cache of bounding-box query results keyed by tile bounds.
pub struct TileCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    staleness_window: Duration,
}

impl Default for TileCache {
    fn default() -> Self {
        Self::new(DEFAULT_STALENESS_WINDOW)
    }
}

impl TileCache {
    /// Create a cache with the given staleness window.
    pub fn new(staleness_window: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            staleness_window,
        }
    }

    /// Cache key for a tile: bounds rounded to four decimal degrees,
    /// joined into a single string.
    pub fn key(tile: &Tile) -> String {
        format!(
            "{:.p$},{:.p$},{:.p$},{:.p$}",
            tile.south,
            tile.west,
            tile.north,
            tile.east,
            p = KEY_PRECISION
        )
    }

    /// Returns the cached peaks for a key, or `None` when absent or
    /// older than the staleness window (a stale entry behaves exactly
    /// like a miss).
    pub fn get(&self, key: &str) -> Option<Vec<Peak>> {
        let entries = self.entries.lock().unwrap();
        let entry = entries.get(key)?;
        if entry.fetched_at.elapsed() < self.staleness_window {
            Some(entry.peaks.clone())
        } else {
            None
        }
    }

    /// Stores peaks under a key with the current timestamp, replacing
    /// any prior entry.
    pub fn put(&self, key: String, peaks: Vec<Peak>) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key,
            CacheEntry {
                fetched_at: Instant::now(),
                peaks,
            },
        );
    }

    /// Number of entries currently held (fresh or stale).
    pub fn entry_count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Backdate an entry's fetch timestamp. Test hook for exercising
    /// the staleness window without sleeping.
    #[cfg(test)]
    pub(crate) fn age_entry(&self, key: &str, by: Duration) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.get_mut(key) {
            entry.fetched_at -= by;
        }
    }
}
