//! Palette selection.
//!
//! Sampling runs in two phases:
//! 1. Count - one pass over the source builds a [`ColorHistogram`] of distinct
//!    colors in first-occurrence order (row-major scan). Colors are told apart
//!    at the 8-bit precision the encoder writes, so 16-bit inputs never yield
//!    two palette entries that come out identical.
//! 2. Rank - a [`ColorSampler`] strategy orders the distinct colors, and the
//!    first `n` become the palette.
//!
//! Both phases are deterministic. Ties keep first-occurrence order, and the
//! parallel count merges row bands in order so it sees the same sequence as the
//! serial scan.

use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashMap;

use crate::color::Color;
use crate::error::{ReducerError, Result};
use crate::grid::{Bounds, PixelSource};
use crate::palette::Palette;

// ============================================================================
// SETTINGS
// ============================================================================

/// Which ranking strategy picks the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplerKind {
    /// Distance from the mean color, weighted by occurrence
    Contrast,
    /// Raw pixel count
    Popularity,
}

/// How repeated sightings of a color are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weighting {
    /// Every distinct color counts once, however many pixels carry it
    Presence,
    /// Every pixel counts
    Frequency,
}

/// What to do when the image has fewer distinct colors than requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShortfallPolicy {
    /// Return every distinct color
    Clamp,
    /// Fail with `InsufficientColors`
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerSettings {
    /// Ranking strategy (default: contrast)
    pub kind: SamplerKind,
    /// Occurrence weighting for the contrast strategy (default: presence)
    pub weighting: Weighting,
    /// Behavior when the image runs out of distinct colors (default: clamp)
    pub shortfall: ShortfallPolicy,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            kind: SamplerKind::Contrast,
            weighting: Weighting::Presence,
            shortfall: ShortfallPolicy::Clamp,
        }
    }
}

impl SamplerSettings {
    /// Instantiate the configured strategy.
    pub fn build(&self) -> Box<dyn ColorSampler> {
        match self.kind {
            SamplerKind::Contrast => Box::new(ContrastSampler::new(self.weighting)),
            SamplerKind::Popularity => Box::new(PopularitySampler),
        }
    }
}

// ============================================================================
// COUNTING
// ============================================================================

/// A distinct color and how often it was counted.
///
/// `color` is the first source color seen for its 8-bit value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorFrequency {
    pub color: Color,
    pub count: u64,
}

/// Distinct colors of a source in first-occurrence order.
#[derive(Debug, Clone)]
pub struct ColorHistogram {
    entries: Vec<ColorFrequency>,
    index: HashMap<Color, usize>,
    weighting: Weighting,
}

impl ColorHistogram {
    fn empty(weighting: Weighting) -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            weighting,
        }
    }

    fn record(&mut self, color: Color, count: u64) {
        let key = color.normalized();
        match self.index.get(&key) {
            Some(&i) => {
                if self.weighting == Weighting::Frequency {
                    self.entries[i].count += count;
                }
            }
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(ColorFrequency { color, count });
            }
        }
    }

    fn count_rows<S: PixelSource + ?Sized>(
        source: &S,
        bounds: Bounds,
        rows: std::ops::Range<i32>,
        weighting: Weighting,
    ) -> Self {
        let mut hist = Self::empty(weighting);
        for y in rows {
            for x in bounds.min_x..bounds.max_x {
                hist.record(source.color_at(x, y), 1);
            }
        }
        hist
    }

    /// Single-threaded scan of every pixel.
    pub fn count<S: PixelSource + ?Sized>(source: &S, weighting: Weighting) -> Self {
        let bounds = source.bounds();
        if bounds.is_empty() {
            return Self::empty(weighting);
        }
        Self::count_rows(source, bounds, bounds.min_y..bounds.max_y, weighting)
    }

    /// Count row bands in parallel, then merge them in row order.
    pub fn par_count<S: PixelSource + ?Sized>(source: &S, weighting: Weighting) -> Self {
        let bounds = source.bounds();
        if bounds.is_empty() {
            return Self::empty(weighting);
        }

        let height = bounds.height();
        let bands = (rayon::current_num_threads() as u32).clamp(1, height);
        let band_height = height.div_ceil(bands);

        let partials: Vec<ColorHistogram> = (0..bands)
            .into_par_iter()
            .map(|band| {
                let offset = (band as i64) * (band_height as i64);
                let start = (bounds.min_y as i64 + offset).min(bounds.max_y as i64) as i32;
                let end = (start as i64 + band_height as i64).min(bounds.max_y as i64) as i32;
                Self::count_rows(source, bounds, start..end, weighting)
            })
            .collect();

        let mut merged = Self::empty(weighting);
        for partial in partials {
            for entry in partial.entries {
                merged.record(entry.color, entry.count);
            }
        }
        merged
    }

    pub fn entries(&self) -> &[ColorFrequency] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Per-channel integer mean over the distinct colors, taken on their
    /// normalized 8-bit values.
    pub fn mean(&self) -> Option<Color> {
        if self.entries.is_empty() {
            return None;
        }
        let mut totals = [0u64; 4];
        for entry in &self.entries {
            for (total, channel) in totals.iter_mut().zip(entry.color.normalized().channels()) {
                *total += channel as u64;
            }
        }
        let n = self.entries.len() as u64;
        Some(Color::new(
            (totals[0] / n) as u16,
            (totals[1] / n) as u16,
            (totals[2] / n) as u16,
            (totals[3] / n) as u16,
        ))
    }
}

// ============================================================================
// RANKING STRATEGIES
// ============================================================================

/// A palette selection heuristic.
pub trait ColorSampler: Send + Sync {
    /// How the histogram handed to `rank` should be counted.
    fn weighting(&self) -> Weighting;

    /// Order distinct colors from most to least representative.
    fn rank(&self, histogram: &ColorHistogram) -> Vec<Color>;
}

/// Favors colors that are far from the image's average tone, weighted by how
/// often they occur.
#[derive(Debug, Clone, Copy)]
pub struct ContrastSampler {
    weighting: Weighting,
}

impl ContrastSampler {
    pub fn new(weighting: Weighting) -> Self {
        Self { weighting }
    }
}

impl Default for ContrastSampler {
    fn default() -> Self {
        Self::new(Weighting::Presence)
    }
}

impl ColorSampler for ContrastSampler {
    fn weighting(&self) -> Weighting {
        self.weighting
    }

    fn rank(&self, histogram: &ColorHistogram) -> Vec<Color> {
        let Some(mean) = histogram.mean() else {
            return Vec::new();
        };
        debug!("Mean color: {}", mean);

        let mut scored: Vec<(u64, Color)> = histogram
            .entries()
            .iter()
            .map(|e| {
                let distance = e.color.normalized().squared_channel_distance(mean);
                let score = distance.saturating_mul(e.count);
                (score, e.color)
            })
            .collect();
        // Stable: equal scores keep first-occurrence order
        scored.sort_by_key(|&(score, _)| Reverse(score));
        scored.into_iter().map(|(_, c)| c).collect()
    }
}

/// Most frequent colors first.
#[derive(Debug, Clone, Copy, Default)]
pub struct PopularitySampler;

impl ColorSampler for PopularitySampler {
    fn weighting(&self) -> Weighting {
        Weighting::Frequency
    }

    fn rank(&self, histogram: &ColorHistogram) -> Vec<Color> {
        let mut entries = histogram.entries().to_vec();
        entries.sort_by_key(|e| Reverse(e.count));
        entries.into_iter().map(|e| e.color).collect()
    }
}

// ============================================================================
// ENTRY POINT
// ============================================================================

/// Select `n` representative colors from `source`.
pub fn sample_colors<S: PixelSource + ?Sized>(
    source: &S,
    n: usize,
    sampler: &dyn ColorSampler,
    shortfall: ShortfallPolicy,
    parallel: bool,
) -> Result<Palette> {
    if n == 0 {
        return Err(ReducerError::InvalidParameter(
            "palette size must be at least 1".to_string(),
        ));
    }

    let histogram = if parallel {
        ColorHistogram::par_count(source, sampler.weighting())
    } else {
        ColorHistogram::count(source, sampler.weighting())
    };
    if histogram.is_empty() {
        return Err(ReducerError::EmptyImage);
    }

    let available = histogram.len();
    debug!("Found {} distinct colors", available);
    if available < n {
        match shortfall {
            ShortfallPolicy::Fail => {
                return Err(ReducerError::InsufficientColors { requested: n, available });
            }
            ShortfallPolicy::Clamp => {
                warn!(
                    "Requested {} colors but only {} are present; using {}",
                    n, available, available
                );
            }
        }
    }

    let mut ranked = sampler.rank(&histogram);
    ranked.truncate(n);
    for c in &ranked {
        debug!("Palette entry: {}", c);
    }
    Palette::new(ranked)
}
