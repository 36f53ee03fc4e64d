use crate::error::Result;
use crate::grid::{PixelGrid, PixelSource};
use crate::outline::{self, OutlineWindow};
use crate::palette::Palette;
use crate::remap;
use crate::sampler::{self, ColorSampler, ContrastSampler, ShortfallPolicy};
use crate::settings::ReducerSettings;

/// The three reduction capabilities. Implementations may differ in how they
/// pick colors while sharing the remap and outline passes.
pub trait ColorReducer {
    fn sample_colors(&self, source: &dyn PixelSource, n: usize) -> Result<Palette>;

    fn reduce_image(&self, source: &dyn PixelSource, palette: &Palette) -> PixelGrid;

    fn outline_image(&self, source: &dyn PixelSource) -> PixelGrid;
}

/// Reducer with a pluggable sampling strategy.
pub struct Reducer {
    sampler: Box<dyn ColorSampler>,
    shortfall: ShortfallPolicy,
    window: OutlineWindow,
    parallel: bool,
}

impl Default for Reducer {
    fn default() -> Self {
        Self::new(Box::new(ContrastSampler::default()))
    }
}

impl Reducer {
    pub fn new(sampler: Box<dyn ColorSampler>) -> Self {
        Self {
            sampler,
            shortfall: ShortfallPolicy::Clamp,
            window: OutlineWindow::Full,
            parallel: true,
        }
    }

    pub fn from_settings(settings: &ReducerSettings) -> Self {
        Self {
            sampler: settings.sampler.build(),
            shortfall: settings.sampler.shortfall,
            window: settings.outline.window,
            parallel: settings.parallel,
        }
    }

    pub fn shortfall(mut self, policy: ShortfallPolicy) -> Self {
        self.shortfall = policy;
        self
    }

    pub fn window(mut self, window: OutlineWindow) -> Self {
        self.window = window;
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

impl ColorReducer for Reducer {
    fn sample_colors(&self, source: &dyn PixelSource, n: usize) -> Result<Palette> {
        sampler::sample_colors(source, n, self.sampler.as_ref(), self.shortfall, self.parallel)
    }

    fn reduce_image(&self, source: &dyn PixelSource, palette: &Palette) -> PixelGrid {
        if self.parallel {
            remap::par_reduce_image(source, palette)
        } else {
            remap::reduce_image(source, palette)
        }
    }

    fn outline_image(&self, source: &dyn PixelSource) -> PixelGrid {
        if self.parallel {
            outline::par_outline_image(source, self.window)
        } else {
            outline::outline_image(source, self.window)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::error::ReducerError;
    use crate::grid::Bounds;
    use crate::sampler::PopularitySampler;

    fn stripes() -> PixelGrid {
        PixelGrid::from_fn(Bounds::from_size(6, 4), |x, _| match x / 2 {
            0 => Color::from_rgb8(250, 10, 10),
            1 => Color::from_rgb8(10, 250, 10),
            _ => Color::from_rgb8(10, 10, 250),
        })
    }

    #[test]
    fn test_strategies_share_remap_and_outline() {
        let grid = stripes();
        let reducers: Vec<Box<dyn ColorReducer>> = vec![
            Box::new(Reducer::default()),
            Box::new(Reducer::new(Box::new(PopularitySampler)).parallel(false)),
        ];
        for reducer in &reducers {
            let palette = reducer.sample_colors(&grid, 3).unwrap();
            assert_eq!(palette.len(), 3);
            let reduced = reducer.reduce_image(&grid, &palette);
            assert_eq!(reduced, grid);
            let mask = reducer.outline_image(&reduced);
            // Stripe boundaries at x = 1..=4 are edges, the outer columns are flat
            assert_eq!(mask.color_at(0, 0), Color::WHITE);
            assert_eq!(mask.color_at(5, 3), Color::WHITE);
            assert_eq!(mask.color_at(2, 1), Color::BLACK);
        }
    }

    #[test]
    fn test_strict_shortfall() {
        let grid = stripes();
        let reducer = Reducer::default().shortfall(ShortfallPolicy::Fail);
        assert!(matches!(
            reducer.sample_colors(&grid, 4),
            Err(ReducerError::InsufficientColors { requested: 4, available: 3 })
        ));
    }

    #[test]
    fn test_from_settings() {
        let mut settings = ReducerSettings::default();
        settings.outline.window = OutlineWindow::Legacy;
        settings.parallel = false;
        let reducer = Reducer::from_settings(&settings);
        let grid = stripes();
        // Legacy window does not look right, so the last column of the
        // middle stripe stays white
        let mask = reducer.outline_image(&grid);
        assert_eq!(mask.color_at(3, 1), Color::WHITE);
        assert_eq!(mask.color_at(2, 1), Color::BLACK);
    }
}
