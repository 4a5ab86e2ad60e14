pub mod batch;
pub mod clahe;
pub mod color;
pub mod error;
pub mod gamma;
pub mod pipeline;

pub use clahe::GridShape;
pub use error::EnhanceError;
pub use pipeline::{enhance, enhance_rgb, EnhanceParams, RasterImage};
