use serde::{Serialize, Serializer};

use crate::color::Color;
use crate::error::{ReducerError, Result};

/// Ordered, non-empty set of representative colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<Color>,
}

impl Palette {
    pub fn new(entries: Vec<Color>) -> Result<Self> {
        if entries.is_empty() {
            return Err(ReducerError::EmptyPalette);
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[Color] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, color: &Color) -> bool {
        self.entries.contains(color)
    }

    /// Index of the entry closest to `color`.
    ///
    /// Distance is squared Euclidean over 8-bit R, G, B; alpha is ignored.
    /// On equal distance the earliest entry wins.
    pub fn nearest_index(&self, color: Color) -> usize {
        let mut best = 0;
        let mut best_dist = u32::MAX;
        for (i, entry) in self.entries.iter().enumerate() {
            let dist = color.rgb8_distance(*entry);
            if dist < best_dist {
                best_dist = dist;
                best = i;
                if dist == 0 {
                    break;
                }
            }
        }
        best
    }

    /// Palette entry closest to `color`.
    pub fn nearest(&self, color: Color) -> Color {
        self.entries[self.nearest_index(color)]
    }
}

impl Serialize for Palette {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.entries.iter().map(|c| c.to_hex()))
    }
}

/// Nearest-color lookup over a bare slice. Fails on an empty slice.
pub fn nearest(color: Color, entries: &[Color]) -> Result<Color> {
    let mut closest: Option<(Color, u32)> = None;
    for &entry in entries {
        let dist = color.rgb8_distance(entry);
        match closest {
            Some((_, best)) if dist >= best => {}
            _ => closest = Some((entry, dist)),
        }
    }
    closest.map(|(c, _)| c).ok_or(ReducerError::EmptyPalette)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color::from_rgb8(r, g, b)
    }

    #[test]
    fn test_empty_palette_rejected() {
        assert!(matches!(Palette::new(Vec::new()), Err(ReducerError::EmptyPalette)));
        assert!(matches!(nearest(rgb(1, 2, 3), &[]), Err(ReducerError::EmptyPalette)));
    }

    #[test]
    fn test_member_maps_to_itself() {
        let palette = Palette::new(vec![rgb(0, 0, 0), rgb(255, 0, 0), rgb(0, 0, 255)]).unwrap();
        for &c in palette.entries() {
            assert_eq!(palette.nearest(c), c);
        }
    }

    #[test]
    fn test_tie_goes_to_earliest_entry() {
        // (10,0,0) is 10 away from both (0,0,0) and (20,0,0)
        let palette = Palette::new(vec![rgb(20, 0, 0), rgb(0, 0, 0)]).unwrap();
        assert_eq!(palette.nearest(rgb(10, 0, 0)), rgb(20, 0, 0));
        assert_eq!(palette.nearest_index(rgb(10, 0, 0)), 0);

        let flipped = [rgb(0, 0, 0), rgb(20, 0, 0)];
        assert_eq!(nearest(rgb(10, 0, 0), &flipped).unwrap(), rgb(0, 0, 0));
    }

    #[test]
    fn test_alpha_ignored() {
        let transparent_red = Color::from_rgba8(250, 0, 0, 0);
        let palette = Palette::new(vec![rgb(0, 0, 0), transparent_red]).unwrap();
        assert_eq!(palette.nearest(rgb(255, 0, 0)), transparent_red);
    }

    #[test]
    fn test_free_fn_agrees_with_palette() {
        let entries = vec![rgb(12, 200, 3), rgb(90, 90, 90), rgb(240, 10, 128)];
        let palette = Palette::new(entries.clone()).unwrap();
        for query in [rgb(0, 0, 0), rgb(100, 120, 80), rgb(255, 0, 255)] {
            assert_eq!(nearest(query, &entries).unwrap(), palette.nearest(query));
        }
    }

    #[test]
    fn test_serializes_as_hex() {
        let palette = Palette::new(vec![rgb(255, 0, 0)]).unwrap();
        assert_eq!(serde_json::to_string(&palette).unwrap(), r##"["#ff0000ff"]"##);
    }
}
