//! Per-link frame accounting.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::types::LinkIndex;

/// Frame counts per egress link, indexed by 1-based link number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTally {
    counts: Vec<u64>,
}

impl LinkTally {
    pub fn new(active_links: u16) -> Self {
        Self {
            counts: vec![0; usize::from(active_links)],
        }
    }

    /// Count one frame on `link`.
    pub fn record(&mut self, link: LinkIndex) {
        self.record_many(link, 1);
    }

    /// Count `frames` frames on `link`.
    ///
    /// Panics if `link` is outside the bundle the tally was created for.
    pub fn record_many(&mut self, link: LinkIndex, frames: u64) {
        self.counts[link.slot()] += frames;
    }

    /// Add another tally of the same bundle into this one.
    pub fn merge(&mut self, other: &LinkTally) {
        debug_assert_eq!(self.counts.len(), other.counts.len());
        for (mine, theirs) in self.counts.iter_mut().zip(&other.counts) {
            *mine += theirs;
        }
    }

    pub fn get(&self, link: LinkIndex) -> u64 {
        self.counts.get(link.slot()).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn links(&self) -> usize {
        self.counts.len()
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// `(link, frames)` pairs in link order.
    pub fn iter(&self) -> impl Iterator<Item = (LinkIndex, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .map(|(slot, &count)| (LinkIndex(slot as u16 + 1), count))
    }

    /// Link carrying the most frames (lowest index on ties).
    pub fn busiest(&self) -> Option<(LinkIndex, u64)> {
        self.iter()
            .fold(None, |best, (link, count)| match best {
                Some((_, top)) if top >= count => best,
                _ => Some((link, count)),
            })
    }

    /// Frames each link would carry under a perfectly even split.
    pub fn uniform_share(&self) -> f64 {
        if self.counts.is_empty() {
            return 0.0;
        }
        self.total() as f64 / self.counts.len() as f64
    }

    pub fn stats(&self) -> TallyStats {
        TallyStats::from_counts(&self.counts)
    }
}

/// Spread of a tally's per-link counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TallyStats {
    pub mean: f64,
    /// Sample standard deviation.
    pub std_dev: f64,
    pub min: u64,
    pub max: u64,
    /// `max / mean`; 1.0 is a perfectly even bundle.
    pub imbalance: f64,
}

impl TallyStats {
    pub fn from_counts(counts: &[u64]) -> Self {
        if counts.is_empty() {
            return Self {
                mean: 0.0,
                std_dev: 0.0,
                min: 0,
                max: 0,
                imbalance: 0.0,
            };
        }

        let values: Vec<f64> = counts.iter().map(|&c| c as f64).collect();
        let mean = Statistics::mean(values.iter());
        let std_dev = if values.len() < 2 {
            0.0
        } else {
            Statistics::std_dev(values.iter())
        };
        let min = counts.iter().copied().min().unwrap_or(0);
        let max = counts.iter().copied().max().unwrap_or(0);
        let imbalance = if mean > 0.0 { max as f64 / mean } else { 0.0 };

        Self {
            mean,
            std_dev,
            min,
            max,
            imbalance,
        }
    }
}
