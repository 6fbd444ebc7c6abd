use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while setting up, exporting or reloading an annotation session.
#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to load image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to load label font: {0}")]
    Font(String),

    #[error("Failed to open annotation window: {0}")]
    Window(String),

    #[error("Failed to write overlay image {path}: {source}")]
    ImageWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write polygon record {path}: {source}")]
    RecordWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode polygon record: {0}")]
    RecordEncode(#[source] serde_json::Error),

    #[error("Polygon record is not valid UTF-8: {0}")]
    RecordUtf8(#[from] std::string::FromUtf8Error),

    #[error("Failed to parse polygon record: {0}")]
    RecordParse(#[from] serde_json::Error),

    #[error("Invalid polygon record: {0}")]
    InvalidRecord(String),
}
