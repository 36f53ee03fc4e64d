//! Run configuration.
//!
//! Settings are plain serde structs so a run can be described in a JSON file
//! and every field falls back to its default when omitted.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ReducerError, Result};
use crate::outline::OutlineWindow;
use crate::sampler::SamplerSettings;

/// Default palette size.
pub const DEFAULT_COLORS: usize = 24;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineSettings {
    /// Produce the outline mask (default: false)
    pub enabled: bool,
    /// Neighborhood compared against each pixel (default: full)
    pub window: OutlineWindow,
}

impl Default for OutlineSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            window: OutlineWindow::Full,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReducerSettings {
    /// Number of palette colors (default: 24)
    pub colors: usize,
    pub sampler: SamplerSettings,
    pub outline: OutlineSettings,
    /// Spread per-pixel work across threads (default: true)
    pub parallel: bool,
}

impl Default for ReducerSettings {
    fn default() -> Self {
        Self {
            colors: DEFAULT_COLORS,
            sampler: SamplerSettings::default(),
            outline: OutlineSettings::default(),
            parallel: true,
        }
    }
}

impl ReducerSettings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.colors == 0 {
            return Err(ReducerError::InvalidParameter(
                "colors must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
