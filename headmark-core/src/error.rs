//! Error types for headmark

use crate::landmark::LandmarkLabel;
use thiserror::Error;

/// Main error type for headmark operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing landmarks: {}", format_labels(.labels))]
    MissingLandmark { labels: Vec<LandmarkLabel> },

    #[error("Landmark {0} given more than once")]
    DuplicateLandmark(LandmarkLabel),

    #[error("Invalid image size: {width}x{height}")]
    InvalidImageSize { width: u32, height: u32 },

    #[error("Landmark {label} cannot be projected onto the image plane")]
    Unprojectable { label: LandmarkLabel },

    #[error("Annotation format error at line {line}: {message}")]
    Format { line: usize, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl Error {
    /// Build a format error for a 1-based line number
    pub fn format(line: usize, message: impl Into<String>) -> Self {
        Error::Format {
            line,
            message: message.into(),
        }
    }
}

fn format_labels(labels: &[LandmarkLabel]) -> String {
    labels
        .iter()
        .map(|l| l.display_name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias for headmark operations
pub type Result<T> = std::result::Result<T, Error>;
