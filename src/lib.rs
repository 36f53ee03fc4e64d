//! Color reduction for photographs.
//!
//! Picks a small palette of representative colors from an image, remaps every
//! pixel to its nearest palette color, and can derive a black/white outline
//! mask from the result.
//!
//! ```no_run
//! use color_reducer::{ColorReducer, Reducer};
//! use std::path::Path;
//!
//! let grid = color_reducer::pipeline::load_image(Path::new("photo.jpg"))?;
//! let reducer = Reducer::default();
//! let palette = reducer.sample_colors(&grid, 24)?;
//! let reduced = reducer.reduce_image(&grid, &palette);
//! let mask = reducer.outline_image(&reduced);
//! # Ok::<(), color_reducer::ReducerError>(())
//! ```

pub mod color;
pub mod error;
pub mod grid;
pub mod outline;
pub mod palette;
pub mod pipeline;
pub mod reducer;
pub mod remap;
pub mod sampler;
pub mod settings;

pub use color::Color;
pub use error::{ReducerError, Result, Stage};
pub use grid::{Bounds, PixelGrid, PixelSource};
pub use outline::OutlineWindow;
pub use palette::Palette;
pub use reducer::{ColorReducer, Reducer};
pub use sampler::{
    ColorSampler, ContrastSampler, PopularitySampler, SamplerKind, ShortfallPolicy, Weighting,
};
pub use settings::{OutlineSettings, ReducerSettings};
