//! Outline mask extraction.
//!
//! A pixel is part of the outline (black) when any pixel in its clipped
//! neighborhood has a different color; otherwise it is white. Neighborhoods
//! are clipped at the grid edges, never wrapped or padded.

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::color::Color;
use crate::grid::{Bounds, PixelGrid, PixelSource};

/// Neighborhood inspected around each pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlineWindow {
    /// Full 3x3 block centered on the pixel
    #[default]
    Full,
    /// Pixel plus its left, upper and upper-left neighbors. Reproduces masks
    /// made by earlier releases, which marked edges on one side only.
    Legacy,
}

impl OutlineWindow {
    /// Rows and columns to inspect for `(x, y)`, clipped to `bounds`.
    fn ranges(self, x: i32, y: i32, bounds: &Bounds) -> (Range<i32>, Range<i32>) {
        let reach = match self {
            OutlineWindow::Full => 2,
            OutlineWindow::Legacy => 1,
        };
        let rows = y.saturating_sub(1).max(bounds.min_y)
            ..y.saturating_add(reach).min(bounds.max_y);
        let cols = x.saturating_sub(1).max(bounds.min_x)
            ..x.saturating_add(reach).min(bounds.max_x);
        (rows, cols)
    }
}

/// True when every inspected neighbor matches the center color exactly.
fn is_flat<S: PixelSource + ?Sized>(
    source: &S,
    bounds: &Bounds,
    x: i32,
    y: i32,
    window: OutlineWindow,
) -> bool {
    let center = source.color_at(x, y);
    let (rows, cols) = window.ranges(x, y, bounds);
    rows.flat_map(|ny| cols.clone().map(move |nx| (nx, ny)))
        .all(|(nx, ny)| source.color_at(nx, ny) == center)
}

fn mask_color(flat: bool) -> Color {
    if flat {
        Color::WHITE
    } else {
        Color::BLACK
    }
}

/// Binary edge mask with the same bounds as `source`.
pub fn outline_image<S: PixelSource + ?Sized>(source: &S, window: OutlineWindow) -> PixelGrid {
    let bounds = source.bounds();
    PixelGrid::from_fn(bounds, |x, y| mask_color(is_flat(source, &bounds, x, y, window)))
}

/// Row-parallel [`outline_image`]. Produces an identical grid.
pub fn par_outline_image<S: PixelSource + ?Sized>(source: &S, window: OutlineWindow) -> PixelGrid {
    let bounds = source.bounds();
    PixelGrid::par_from_fn(bounds, |x, y| mask_color(is_flat(source, &bounds, x, y, window)))
}
