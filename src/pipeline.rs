//! File-to-file reduction run.
//!
//! Stages run in order and stop at the first failure:
//! 1. Load - decode the input image
//! 2. Sample - pick the palette
//! 3. Reduce - remap every pixel, then write the reduced PNG
//! 4. Outline - (optional) build the edge mask from the reduced image, then write it
//!
//! Outputs are encoded in memory and moved into place only after the bytes
//! are fully written, so a failed stage never leaves a partial file behind.

use image::ImageFormat;
use log::info;
use serde::Serialize;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::error::{ReducerError, Result, Stage};
use crate::grid::PixelGrid;
use crate::palette::Palette;
use crate::reducer::{ColorReducer, Reducer};
use crate::settings::ReducerSettings;

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct ReduceReport {
    pub original_size: (u32, u32),
    pub requested_colors: usize,
    pub palette: Palette,
    pub reduced_output: PathBuf,
    pub outline_output: Option<PathBuf>,
}

/// Decode an image from disk.
pub fn load_image(path: &Path) -> Result<PixelGrid> {
    let img = image::open(path).map_err(|e| ReducerError::InputUnavailable {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(PixelGrid::from_dynamic(&img))
}

/// Encode a grid as 8-bit RGBA PNG bytes.
pub fn encode_png(grid: &PixelGrid) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    grid.to_rgba8().write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

/// Write bytes through a temporary sibling file so `path` is either absent or complete.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));

    let result = fs::write(&tmp, bytes).and_then(|_| fs::rename(&tmp, path));
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

/// Encode `grid` as PNG and save it, tagging failures with `stage`.
pub fn save_png(grid: &PixelGrid, path: &Path, stage: Stage) -> Result<()> {
    let bytes = encode_png(grid).map_err(|e| ReducerError::output(stage, path, e))?;
    write_atomic(path, &bytes).map_err(|e| ReducerError::output(stage, path, e.into()))
}

/// Run the whole reduction for one input file.
///
/// The outline stage only runs when `settings.outline.enabled` is set and the
/// reduced image was written successfully.
pub fn process_image(
    input_path: &Path,
    reduced_path: &Path,
    outline_path: &Path,
    settings: &ReducerSettings,
) -> Result<ReduceReport> {
    settings.validate()?;

    let source = load_image(input_path)?;
    let original_size = (source.width(), source.height());
    info!(
        "Loaded {} ({}x{})",
        input_path.display(),
        original_size.0,
        original_size.1
    );

    let reducer = Reducer::from_settings(settings);

    info!("Sampling colors...");
    let palette = reducer.sample_colors(&source, settings.colors)?;

    info!("Generating reduced image...");
    let reduced = reducer.reduce_image(&source, &palette);
    save_png(&reduced, reduced_path, Stage::Reduced)?;
    info!("Wrote {}", reduced_path.display());

    let outline_output = if settings.outline.enabled {
        info!("Generating outline...");
        let mask = reducer.outline_image(&reduced);
        save_png(&mask, outline_path, Stage::Outline)?;
        info!("Wrote {}", outline_path.display());
        Some(outline_path.to_path_buf())
    } else {
        None
    };

    Ok(ReduceReport {
        original_size,
        requested_colors: settings.colors,
        palette,
        reduced_output: reduced_path.to_path_buf(),
        outline_output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::grid::Bounds;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "color-reducer-pipeline-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_encode_png_roundtrip() {
        let grid = PixelGrid::from_fn(Bounds::from_size(3, 2), |x, y| {
            Color::from_rgba8(x as u8 * 80, y as u8 * 100, 7, 255)
        });
        let bytes = encode_png(&grid).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(PixelGrid::from_dynamic(&decoded), grid);
    }

    #[test]
    fn test_missing_input() {
        let dir = scratch_dir("missing");
        let err = process_image(
            &dir.join("nope.jpg"),
            &dir.join("reduced.png"),
            &dir.join("outline.png"),
            &ReducerSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ReducerError::InputUnavailable { .. }));
        assert!(!dir.join("reduced.png").exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_write_atomic_creates_parent_and_leaves_no_temp() {
        let dir = scratch_dir("atomic");
        let target = dir.join("nested").join("out.png");
        write_atomic(&target, b"data").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"data");
        assert!(!dir.join("nested").join(".out.png.tmp").exists());
        let _ = fs::remove_dir_all(&dir);
    }
}
