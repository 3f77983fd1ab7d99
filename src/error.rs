use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid geometry format: {0}")]
    InvalidGeometry(String),

    #[error("Invalid capture region: {0}")]
    InvalidRegion(String),

    #[error("No outputs available")]
    NoOutputs,

    #[error("Buffer creation failed: {0}")]
    BufferCreation(String),

    #[error("Unsupported pixel format: {0}")]
    UnsupportedFormat(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO error during {operation}: {source}")]
    IoWithContext {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Clipboard error: {0}")]
    Clipboard(#[from] arboard::Error),

    #[error("Compositor doesn't support required protocol: {0}")]
    UnsupportedProtocol(String),

    #[error("Wayland connection error: {0}")]
    WaylandConnection(String),

    #[error("Frame capture failed: {0}")]
    FrameCapture(String),

    #[error("Overlay failed: {0}")]
    Overlay(String),
}

pub type Result<T> = std::result::Result<T, Error>;
