//! Full enhancement pipeline:
//! split channels -> CLAHE on luminance -> merge -> gamma over all channels

use image::{GrayImage, RgbImage};
use tracing::debug;

use crate::clahe::{clahe, GridShape};
use crate::color::{lab_to_rgb, rgb_to_lab};
use crate::error::EnhanceError;
use crate::gamma::GammaLut;

/// Enhancement parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnhanceParams {
    pub gamma: f64,
    pub clip_limit: f64,
    pub grid: GridShape,
}

impl Default for EnhanceParams {
    fn default() -> Self {
        Self::balanced()
    }
}

impl EnhanceParams {
    /// Mild brightening with moderate contrast limiting.
    pub fn balanced() -> Self {
        Self {
            gamma: 1.2,
            clip_limit: 1.5,
            grid: GridShape::new(8, 8),
        }
    }

    pub fn mild() -> Self {
        Self {
            gamma: 1.1,
            clip_limit: 1.2,
            grid: GridShape::new(8, 8),
        }
    }

    pub fn strong() -> Self {
        Self {
            gamma: 1.5,
            clip_limit: 2.5,
            grid: GridShape::new(8, 8),
        }
    }

    /// Smaller tiles for more local contrast.
    pub fn fine() -> Self {
        Self {
            gamma: 1.2,
            clip_limit: 2.0,
            grid: GridShape::new(16, 16),
        }
    }

    pub fn from_preset(name: &str) -> Option<Self> {
        match name {
            "balanced" => Some(Self::balanced()),
            "mild" => Some(Self::mild()),
            "strong" => Some(Self::strong()),
            "fine" => Some(Self::fine()),
            _ => None,
        }
    }

    pub fn all_presets() -> Vec<(&'static str, Self)> {
        vec![
            ("balanced", Self::balanced()),
            ("mild", Self::mild()),
            ("strong", Self::strong()),
            ("fine", Self::fine()),
        ]
    }

    pub fn preset_names() -> Vec<&'static str> {
        Self::all_presets().into_iter().map(|(name, _)| name).collect()
    }

    /// Check parameters against an image size and build the gamma table.
    pub fn validate(&self, width: u32, height: u32) -> Result<GammaLut, EnhanceError> {
        if width == 0 || height == 0 {
            return Err(EnhanceError::EmptyImage { width, height });
        }
        self.grid.validate()?;
        GammaLut::new(self.gamma)
    }
}

/// Interleaved 8-bit raster. Channel 0 is luminance; any further channels
/// are side channels carried through CLAHE untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    channels: usize,
    data: Vec<u8>,
}

impl RasterImage {
    pub fn new(
        width: u32,
        height: u32,
        channels: usize,
        data: Vec<u8>,
    ) -> Result<Self, EnhanceError> {
        if channels == 0 {
            return Err(EnhanceError::NoChannels);
        }
        let expected = width as usize * height as usize * channels;
        if data.len() != expected {
            return Err(EnhanceError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self::from_parts(width, height, channels, data))
    }

    /// Callers guarantee `data.len() == width * height * channels`.
    pub(crate) fn from_parts(width: u32, height: u32, channels: usize, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize * channels);
        Self {
            width,
            height,
            channels,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl From<GrayImage> for RasterImage {
    fn from(img: GrayImage) -> Self {
        let (width, height) = img.dimensions();
        Self::from_parts(width, height, 1, img.into_raw())
    }
}

impl From<RgbImage> for RasterImage {
    fn from(img: RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self::from_parts(width, height, 3, img.into_raw())
    }
}

/// Split an interleaved raster into one plane per channel.
pub fn split_channels(image: &RasterImage) -> Vec<Vec<u8>> {
    let n = image.channels;
    if n == 1 {
        return vec![image.data.clone()];
    }

    let mut planes = vec![Vec::with_capacity(image.pixel_count()); n];
    for px in image.data.chunks_exact(n) {
        for (plane, &v) in planes.iter_mut().zip(px) {
            plane.push(v);
        }
    }
    planes
}

/// Interleave equally sized planes back into a raster.
pub fn merge_channels(
    width: u32,
    height: u32,
    planes: &[Vec<u8>],
) -> Result<RasterImage, EnhanceError> {
    if planes.is_empty() {
        return Err(EnhanceError::NoChannels);
    }
    let pixel_count = width as usize * height as usize;
    if let Some(bad) = planes.iter().find(|p| p.len() != pixel_count) {
        return Err(EnhanceError::BufferSize {
            expected: pixel_count,
            actual: bad.len(),
        });
    }

    let n = planes.len();
    let mut data = vec![0u8; pixel_count * n];
    for (c, plane) in planes.iter().enumerate() {
        for (px, &v) in data.chunks_exact_mut(n).zip(plane) {
            px[c] = v;
        }
    }
    Ok(RasterImage::from_parts(width, height, n, data))
}

/// CLAHE on channel 0, side channels passed through, channels re-interleaved.
fn equalize_luminance(
    image: &RasterImage,
    params: &EnhanceParams,
) -> Result<RasterImage, EnhanceError> {
    let (width, height) = (image.width, image.height);
    let mut planes = split_channels(image);
    planes[0] = clahe(&planes[0], width, height, params.clip_limit, params.grid)?;
    merge_channels(width, height, &planes)
}

/// Enhance a raster: CLAHE on the luminance channel, then gamma over every
/// channel of the recombined image.
pub fn enhance(image: &RasterImage, params: &EnhanceParams) -> Result<RasterImage, EnhanceError> {
    let gamma = params.validate(image.width, image.height)?;
    debug!(
        width = image.width,
        height = image.height,
        channels = image.channels,
        gamma = gamma.gamma(),
        "enhancing raster"
    );

    let mut merged = equalize_luminance(image, params)?;
    gamma.apply(&mut merged.data);
    Ok(merged)
}

/// Enhance an RGB image: convert to Lab, CLAHE on L, convert back to RGB,
/// then gamma over the RGB channels.
pub fn enhance_rgb(rgb: &RgbImage, params: &EnhanceParams) -> Result<RgbImage, EnhanceError> {
    let (width, height) = rgb.dimensions();
    let gamma = params.validate(width, height)?;
    debug!(width, height, gamma = gamma.gamma(), "enhancing rgb image");

    let lab = rgb_to_lab(rgb);
    let equalized = equalize_luminance(&lab, params)?;
    let mut out = lab_to_rgb(&equalized)?;
    gamma.apply(&mut out);
    Ok(out)
}

/// Enhance a grayscale image directly, the whole image being luminance.
pub fn enhance_gray(gray: &GrayImage, params: &EnhanceParams) -> Result<GrayImage, EnhanceError> {
    let (width, height) = gray.dimensions();
    let data = enhance(&RasterImage::from(gray.clone()), params)?.into_raw();
    let actual = data.len();
    GrayImage::from_raw(width, height, data).ok_or(EnhanceError::BufferSize {
        expected: width as usize * height as usize,
        actual,
    })
}
