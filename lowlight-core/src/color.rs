//! 8-bit sRGB <-> CIELAB conversion.
//!
//! Lab is packed into bytes the common way: `L * 255 / 100`, `a + 128`,
//! `b + 128`, D65 white point. Channel 0 (L) is the luminance plane CLAHE
//! operates on; a and b are the side channels.

use image::RgbImage;
use rayon::prelude::*;

use crate::error::EnhanceError;
use crate::pipeline::RasterImage;

const WHITE_X: f64 = 0.950456;
const WHITE_Z: f64 = 1.088754;
const EPSILON: f64 = 0.008856;
const KAPPA: f64 = 903.3;

#[inline]
fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[inline]
fn linear_to_srgb(l: f64) -> f64 {
    if l <= 0.003_130_8 {
        12.92 * l
    } else {
        1.055 * l.powf(1.0 / 2.4) - 0.055
    }
}

#[inline]
fn lab_f(t: f64) -> f64 {
    if t > EPSILON {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

#[inline]
fn lab_f_inv(t: f64) -> f64 {
    let t3 = t * t * t;
    if t3 > EPSILON {
        t3
    } else {
        (t - 16.0 / 116.0) / 7.787
    }
}

#[inline]
fn to_byte(v: f64) -> u8 {
    (v + 0.5).clamp(0.0, 255.0) as u8
}

/// sRGB byte to linear light, one entry per byte value.
fn linear_table() -> [f64; 256] {
    let mut table = [0.0f64; 256];
    for (v, out) in table.iter_mut().enumerate() {
        *out = srgb_to_linear(v as f64 / 255.0);
    }
    table
}

fn rgb_to_lab_pixel(px: [u8; 3], linear: &[f64; 256]) -> [u8; 3] {
    let r = linear[px[0] as usize];
    let g = linear[px[1] as usize];
    let b = linear[px[2] as usize];

    let x = (0.412453 * r + 0.357580 * g + 0.180423 * b) / WHITE_X;
    let y = 0.212671 * r + 0.715160 * g + 0.072169 * b;
    let z = (0.019334 * r + 0.119193 * g + 0.950227 * b) / WHITE_Z;

    let fy = lab_f(y);
    let l = if y > EPSILON { 116.0 * fy - 16.0 } else { KAPPA * y };
    let a = 500.0 * (lab_f(x) - fy);
    let bb = 200.0 * (fy - lab_f(z));

    [
        to_byte(l * 255.0 / 100.0),
        to_byte(a + 128.0),
        to_byte(bb + 128.0),
    ]
}

fn lab_to_rgb_pixel(px: [u8; 3]) -> [u8; 3] {
    let l = px[0] as f64 * 100.0 / 255.0;
    let a = px[1] as f64 - 128.0;
    let bb = px[2] as f64 - 128.0;

    let fy = (l + 16.0) / 116.0;
    let fx = fy + a / 500.0;
    let fz = fy - bb / 200.0;

    let y = if l > KAPPA * EPSILON { fy * fy * fy } else { l / KAPPA };
    let x = lab_f_inv(fx) * WHITE_X;
    let z = lab_f_inv(fz) * WHITE_Z;

    let r = 3.240479 * x - 1.537150 * y - 0.498535 * z;
    let g = -0.969256 * x + 1.875991 * y + 0.041556 * z;
    let b = 0.055648 * x - 0.204043 * y + 1.057311 * z;

    [r, g, b].map(|c| to_byte(linear_to_srgb(c.clamp(0.0, 1.0)) * 255.0))
}

/// Convert an RGB image to a 3-channel Lab raster (L, a, b interleaved).
pub fn rgb_to_lab(rgb: &RgbImage) -> RasterImage {
    let (width, height) = rgb.dimensions();
    let linear = linear_table();

    let mut data = rgb.as_raw().clone();
    data.par_chunks_exact_mut(3).for_each(|px| {
        let lab = rgb_to_lab_pixel([px[0], px[1], px[2]], &linear);
        px.copy_from_slice(&lab);
    });

    RasterImage::from_parts(width, height, 3, data)
}

/// Convert a 3-channel Lab raster back to RGB.
pub fn lab_to_rgb(lab: &RasterImage) -> Result<RgbImage, EnhanceError> {
    if lab.channels() != 3 {
        return Err(EnhanceError::BufferSize {
            expected: lab.width() as usize * lab.height() as usize * 3,
            actual: lab.data().len(),
        });
    }

    let mut data = lab.data().to_vec();
    data.par_chunks_exact_mut(3).for_each(|px| {
        let rgb = lab_to_rgb_pixel([px[0], px[1], px[2]]);
        px.copy_from_slice(&rgb);
    });

    let actual = data.len();
    RgbImage::from_raw(lab.width(), lab.height(), data).ok_or(EnhanceError::BufferSize {
        expected: lab.pixel_count() * 3,
        actual,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gray_has_neutral_chroma() {
        let linear = linear_table();
        for v in 0..=255u8 {
            let lab = rgb_to_lab_pixel([v, v, v], &linear);
            assert_eq!(lab[1], 128, "a for gray {}", v);
            assert_eq!(lab[2], 128, "b for gray {}", v);
        }
    }

    #[test]
    fn test_extremes() {
        let linear = linear_table();
        assert_eq!(rgb_to_lab_pixel([0, 0, 0], &linear), [0, 128, 128]);
        assert_eq!(rgb_to_lab_pixel([255, 255, 255], &linear), [255, 128, 128]);
        assert_eq!(lab_to_rgb_pixel([0, 128, 128]), [0, 0, 0]);
        assert_eq!(lab_to_rgb_pixel([255, 128, 128]), [255, 255, 255]);
    }

    #[test]
    fn test_gray_round_trip() {
        let linear = linear_table();
        for v in 0..=255u8 {
            let back = lab_to_rgb_pixel(rgb_to_lab_pixel([v, v, v], &linear));
            for c in back {
                assert!(c.abs_diff(v) <= 1, "gray {} came back as {:?}", v, back);
            }
        }
    }

    #[test]
    fn test_mid_range_round_trip() {
        let linear = linear_table();
        for r in (64..=192u8).step_by(16) {
            for g in (64..=192u8).step_by(16) {
                for b in (64..=192u8).step_by(16) {
                    let back = lab_to_rgb_pixel(rgb_to_lab_pixel([r, g, b], &linear));
                    for (c, orig) in back.iter().zip([r, g, b]) {
                        assert!(c.abs_diff(orig) <= 4, "{:?} -> {:?}", [r, g, b], back);
                    }
                }
            }
        }
    }

    #[test]
    fn test_image_round_trip() {
        let rgb = RgbImage::from_fn(5, 4, |x, y| {
            image::Rgb([60 + x as u8 * 20, 90, 70 + y as u8 * 25])
        });
        let lab = rgb_to_lab(&rgb);
        assert_eq!(lab.channels(), 3);
        let back = lab_to_rgb(&lab).unwrap();
        assert_eq!(back.dimensions(), (5, 4));
        for (a, b) in back.as_raw().iter().zip(rgb.as_raw()) {
            assert!(a.abs_diff(*b) <= 4);
        }
    }
}
