//! Pixel grids.
//!
//! `PixelSource` is the read-only view the sampler, reducer and outline pass
//! work against. `PixelGrid` is the owned grid those passes produce.

use image::{ColorType, DynamicImage, ImageBuffer, Rgba, RgbaImage};
use rayon::prelude::*;
use std::ops::Deref;

use crate::color::Color;
use crate::error::{ReducerError, Result};

/// Half-open rectangle `[min_x, max_x) x [min_y, max_y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bounds {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl Bounds {
    pub const fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Bounds anchored at the origin.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    pub fn width(&self) -> u32 {
        span(self.min_x, self.max_x)
    }

    pub fn height(&self) -> u32 {
        span(self.min_y, self.max_y)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn area(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x < self.max_x && y >= self.min_y && y < self.max_y
    }

    fn index(&self, x: i32, y: i32) -> usize {
        span(self.min_y, y) as usize * self.width() as usize + span(self.min_x, x) as usize
    }
}

/// Length of `[min, max)`, zero when inverted. Computed in `i64` so extreme
/// coordinates cannot overflow.
fn span(min: i32, max: i32) -> u32 {
    (max as i64 - min as i64).max(0) as u32
}

/// A 2D grid of colors addressed by integer coordinates inside `bounds()`.
///
/// `color_at` may panic for coordinates outside the bounds, the same way
/// `image::ImageBuffer::get_pixel` does.
pub trait PixelSource: Sync {
    fn bounds(&self) -> Bounds;

    fn color_at(&self, x: i32, y: i32) -> Color;
}

impl<C> PixelSource for ImageBuffer<Rgba<u8>, C>
where
    C: Deref<Target = [u8]> + Sync,
{
    fn bounds(&self) -> Bounds {
        Bounds::from_size(self.width(), self.height())
    }

    fn color_at(&self, x: i32, y: i32) -> Color {
        (*self.get_pixel(x as u32, y as u32)).into()
    }
}

impl<C> PixelSource for ImageBuffer<Rgba<u16>, C>
where
    C: Deref<Target = [u16]> + Sync,
{
    fn bounds(&self) -> Bounds {
        Bounds::from_size(self.width(), self.height())
    }

    fn color_at(&self, x: i32, y: i32) -> Color {
        (*self.get_pixel(x as u32, y as u32)).into()
    }
}

/// Owned, row-major color grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    bounds: Bounds,
    pixels: Vec<Color>,
}

impl PixelGrid {
    /// Wrap a row-major pixel buffer. The buffer length must match the bounds.
    pub fn from_pixels(bounds: Bounds, pixels: Vec<Color>) -> Result<Self> {
        if pixels.len() != bounds.area() {
            return Err(ReducerError::InvalidParameter(format!(
                "pixel buffer length {} does not match dimensions {}x{}",
                pixels.len(),
                bounds.width(),
                bounds.height()
            )));
        }
        Ok(Self { bounds, pixels })
    }

    /// Build a grid by evaluating `f` once per coordinate, row by row.
    pub fn from_fn<F>(bounds: Bounds, mut f: F) -> Self
    where
        F: FnMut(i32, i32) -> Color,
    {
        let mut pixels = Vec::with_capacity(bounds.area());
        if !bounds.is_empty() {
            for y in bounds.min_y..bounds.max_y {
                for x in bounds.min_x..bounds.max_x {
                    pixels.push(f(x, y));
                }
            }
        }
        Self { bounds, pixels }
    }

    /// Same as [`PixelGrid::from_fn`], with rows filled in parallel.
    pub fn par_from_fn<F>(bounds: Bounds, f: F) -> Self
    where
        F: Fn(i32, i32) -> Color + Sync + Send,
    {
        if bounds.is_empty() {
            return Self { bounds, pixels: Vec::new() };
        }

        let width = bounds.width() as usize;
        let mut pixels = vec![Color::default(); bounds.area()];
        pixels
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(row, line)| {
                let y = bounds.min_y + row as i32;
                for (col, slot) in line.iter_mut().enumerate() {
                    *slot = f(bounds.min_x + col as i32, y);
                }
            });

        Self { bounds, pixels }
    }

    /// Copy any pixel source into an owned grid.
    pub fn from_source<S: PixelSource + ?Sized>(source: &S) -> Self {
        Self::from_fn(source.bounds(), |x, y| source.color_at(x, y))
    }

    /// Convert a decoded image, keeping 16-bit precision when the source has it.
    pub fn from_dynamic(img: &DynamicImage) -> Self {
        match img.color() {
            ColorType::L16 | ColorType::La16 | ColorType::Rgb16 | ColorType::Rgba16 => {
                Self::from_source(&img.to_rgba16())
            }
            _ => Self::from_source(&img.to_rgba8()),
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn width(&self) -> u32 {
        self.bounds.width()
    }

    pub fn height(&self) -> u32 {
        self.bounds.height()
    }

    pub fn get(&self, x: i32, y: i32) -> Option<Color> {
        if self.bounds.contains(x, y) {
            Some(self.pixels[self.bounds.index(x, y)])
        } else {
            None
        }
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// 8-bit RGBA copy anchored at the origin, ready for encoding.
    pub fn to_rgba8(&self) -> RgbaImage {
        let b = self.bounds;
        RgbaImage::from_fn(b.width(), b.height(), |x, y| {
            self.color_at(b.min_x + x as i32, b.min_y + y as i32).into()
        })
    }
}

impl PixelSource for PixelGrid {
    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn color_at(&self, x: i32, y: i32) -> Color {
        match self.get(x, y) {
            Some(c) => c,
            None => panic!(
                "pixel ({}, {}) out of bounds {:?}",
                x, y, self.bounds
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_offset_origin() {
        let b = Bounds::new(-2, 3, 2, 5);
        assert_eq!(b.width(), 4);
        assert_eq!(b.height(), 2);
        assert!(b.contains(-2, 3));
        assert!(!b.contains(2, 3));
        assert!(!b.contains(0, 5));
        assert!(Bounds::new(4, 0, 1, 3).is_empty());
    }

    #[test]
    fn test_bounds_at_coordinate_limits() {
        let b = Bounds::new(i32::MIN, i32::MAX - 2, i32::MAX, i32::MAX);
        assert_eq!(b.width(), u32::MAX);
        assert_eq!(b.height(), 2);
        assert!(Bounds::new(i32::MAX, 0, i32::MIN, 1).is_empty());

        let corner = Bounds::new(i32::MAX - 2, i32::MAX - 2, i32::MAX, i32::MAX);
        let grid = PixelGrid::par_from_fn(corner, |x, y| {
            Color::from_rgb8((i32::MAX - x) as u8, (i32::MAX - y) as u8, 0)
        });
        assert_eq!(grid.get(i32::MAX - 1, i32::MAX - 2), Some(Color::from_rgb8(1, 2, 0)));
        assert_eq!(grid.get(i32::MAX, i32::MAX - 1), None);
    }

    #[test]
    fn test_from_fn_matches_par_from_fn() {
        let b = Bounds::new(-3, -1, 5, 6);
        let f = |x: i32, y: i32| Color::from_rgb8((x + 10) as u8, (y + 10) as u8, 0);
        let serial = PixelGrid::from_fn(b, f);
        let parallel = PixelGrid::par_from_fn(b, f);
        assert_eq!(serial, parallel);
        assert_eq!(serial.get(-3, -1), Some(Color::from_rgb8(7, 9, 0)));
        assert_eq!(serial.get(5, 0), None);
    }

    #[test]
    fn test_empty_bounds() {
        let grid = PixelGrid::par_from_fn(Bounds::from_size(0, 4), |_, _| Color::WHITE);
        assert!(grid.pixels().is_empty());
        assert_eq!(grid.height(), 4);
    }

    #[test]
    fn test_from_pixels_rejects_mismatch() {
        let err = PixelGrid::from_pixels(Bounds::from_size(2, 2), vec![Color::BLACK; 3]);
        assert!(matches!(err, Err(ReducerError::InvalidParameter(_))));
    }

    #[test]
    fn test_rgba_image_source() {
        let mut img: RgbaImage = ImageBuffer::from_pixel(3, 2, Rgba([1, 2, 3, 255]));
        img.put_pixel(2, 1, Rgba([9, 8, 7, 6]));
        let grid = PixelGrid::from_source(&img);
        assert_eq!(grid.bounds(), Bounds::from_size(3, 2));
        assert_eq!(grid.color_at(2, 1), Color::from_rgba8(9, 8, 7, 6));
        assert_eq!(grid.to_rgba8(), img);
    }

    #[test]
    fn test_from_dynamic_keeps_16_bit() {
        let img: ImageBuffer<Rgba<u16>, Vec<u16>> =
            ImageBuffer::from_pixel(1, 1, Rgba([0x1234, 0x5678, 0x9abc, 0xffff]));
        let grid = PixelGrid::from_dynamic(&DynamicImage::ImageRgba16(img));
        assert_eq!(grid.color_at(0, 0), Color::new(0x1234, 0x5678, 0x9abc, 0xffff));
    }

    #[test]
    fn test_to_rgba8_from_offset_grid() {
        let grid = PixelGrid::from_fn(Bounds::new(5, 5, 7, 6), |x, _| {
            if x == 5 { Color::BLACK } else { Color::WHITE }
        });
        let img = grid.to_rgba8();
        assert_eq!(img.dimensions(), (2, 1));
        assert_eq!(*img.get_pixel(0, 0), Rgba([0, 0, 0, 255]));
        assert_eq!(*img.get_pixel(1, 0), Rgba([255, 255, 255, 255]));
    }
}
