//! Streaming top-N selection.

use std::cmp::Ordering;

use crate::peak::Peak;

/// Bounded best-of-N set ordered descending by elevation.
///
/// This is an anytime structure: intermediate state is always a
/// valid, fully ranked snapshot suitable for progressive display.
/// Peaks with unknown elevation compare as the lowest possible value
/// but are never discarded outright. Ties keep first-seen order (the
/// re-sort is stable and equal candidates never displace a held
/// entry).
#[derive(Debug, Clone)]
pub struct TopNAggregator {
    limit: usize,
    best: Vec<Peak>,
}

impl TopNAggregator {
    /// Create an aggregator holding at most `limit` peaks.
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            best: Vec::with_capacity(limit),
        }
    }

    /// Offer a candidate.
    ///
    /// Inserted while fewer than N are held; otherwise it replaces
    /// the current minimum only when it strictly exceeds it.
    pub fn offer(&mut self, peak: Peak) {
        if self.best.len() < self.limit {
            self.best.push(peak);
            self.resort();
        } else if let Some(last) = self.best.last() {
            if peak.comparison_elevation() > last.comparison_elevation() {
                let idx = self.best.len() - 1;
                self.best[idx] = peak;
                self.resort();
            }
        }
    }

    /// Current ranked contents, highest elevation first.
    pub fn snapshot(&self) -> Vec<Peak> {
        self.best.clone()
    }

    /// Consume the aggregator, yielding the final ranked list.
    pub fn into_ranked(self) -> Vec<Peak> {
        self.best
    }

    pub fn len(&self) -> usize {
        self.best.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }

    fn resort(&mut self) {
        // Stable: equal elevations keep their insertion order.
        self.best.sort_by(|a, b| {
            b.comparison_elevation()
                .partial_cmp(&a.comparison_elevation())
                .unwrap_or(Ordering::Equal)
        });
    }
}

/// One-shot top-N over a whole candidate set.
pub fn top_n(peaks: impl IntoIterator<Item = Peak>, limit: usize) -> Vec<Peak> {
    let mut agg = TopNAggregator::new(limit);
    for peak in peaks {
        agg.offer(peak);
    }
    agg.into_ranked()
}
