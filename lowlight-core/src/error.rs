/// Input-validation failures of the enhancement core.
///
/// Every variant is raised before any pixel is touched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EnhanceError {
    #[error("Invalid tile grid {rows}x{cols}: rows and cols must both be at least 1")]
    InvalidGrid { rows: usize, cols: usize },

    #[error("Invalid gamma {0}: must be finite and greater than 0")]
    InvalidGamma(f64),

    #[error("Empty image: {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    #[error("Image must have at least one channel")]
    NoChannels,

    #[error("Buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSize { expected: usize, actual: usize },
}
