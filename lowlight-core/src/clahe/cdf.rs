//! Histogram to intensity-remapping table.

use super::tiles::Histogram;

/// 256-entry intensity remapping table for one tile.
pub type Lut = [u8; 256];

/// Identity remapping, used for tiles that contain no pixels.
pub fn identity_lut() -> Lut {
    let mut lut = [0u8; 256];
    for (i, v) in lut.iter_mut().enumerate() {
        *v = i as u8;
    }
    lut
}

/// Build `M[i] = round(255 * cdf(i) / tile_pixels)`.
///
/// `hist` must sum to `tile_pixels` (clipping preserves mass), so the last
/// entry is always 255. Rounding is half-up in integer arithmetic.
pub fn mapping(hist: &Histogram, tile_pixels: usize) -> Lut {
    if tile_pixels == 0 {
        return identity_lut();
    }

    let total = tile_pixels as u64;
    let mut lut = [0u8; 256];
    let mut cdf = 0u64;
    for (out, &bin) in lut.iter_mut().zip(hist.iter()) {
        cdf += bin as u64;
        *out = ((cdf * 255 + total / 2) / total).min(255) as u8;
    }
    lut
}
