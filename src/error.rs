use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Output stage of a reduction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Reduced,
    Outline,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Reduced => f.write_str("reduced image"),
            Stage::Outline => f.write_str("outline image"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ReducerError {
    #[error("Failed to load {}: {source}", .path.display())]
    InputUnavailable {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Requested {requested} colors but the image only has {available} distinct colors")]
    InsufficientColors { requested: usize, available: usize },

    #[error("Palette must contain at least one color")]
    EmptyPalette,

    #[error("Image has no pixels")]
    EmptyImage,

    #[error("Failed to write {stage} to {}: {source}", .path.display())]
    OutputWrite {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: Box<ReducerError>,
    },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl ReducerError {
    /// Wrap an encode or write failure with the stage and destination it belongs to.
    pub fn output(stage: Stage, path: impl Into<PathBuf>, source: ReducerError) -> Self {
        ReducerError::OutputWrite {
            stage,
            path: path.into(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReducerError>;

// Errors are reported as plain messages in JSON output
impl serde::Serialize for ReducerError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
