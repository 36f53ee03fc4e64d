use crate::grid::{PixelGrid, PixelSource};
use crate::palette::Palette;

/// Replace every pixel with its nearest palette color.
///
/// The output covers exactly the input's bounds.
pub fn reduce_image<S: PixelSource + ?Sized>(source: &S, palette: &Palette) -> PixelGrid {
    PixelGrid::from_fn(source.bounds(), |x, y| palette.nearest(source.color_at(x, y)))
}

/// Row-parallel [`reduce_image`]. Produces an identical grid.
pub fn par_reduce_image<S: PixelSource + ?Sized>(source: &S, palette: &Palette) -> PixelGrid {
    PixelGrid::par_from_fn(source.bounds(), |x, y| palette.nearest(source.color_at(x, y)))
}
