//! CLAHE (Contrast Limited Adaptive Histogram Equalization)
//!
//! - Divide the plane into a `rows x cols` tile grid
//! - Per-tile histogram with clip limit and single-pass redistribution
//! - Per-tile CDF lookup tables
//! - Bilinear interpolation between tile LUTs

pub mod cdf;
pub mod clip;
pub mod interpolate;
pub mod tiles;

use rayon::prelude::*;
use tracing::debug;

use crate::error::EnhanceError;

pub use cdf::Lut;
pub use tiles::{GridShape, Histogram, TileGrid};

/// Build one LUT per tile (row-major) from the plane's tile histograms.
pub fn tile_luts(gray: &[u8], grid: &TileGrid, clip_limit: f64) -> Vec<Lut> {
    let cols = grid.shape().cols;
    grid.histograms(gray)
        .into_par_iter()
        .enumerate()
        .map(|(idx, mut hist)| {
            let tile_pixels = grid.tile_pixels(idx / cols, idx % cols);
            if let Some(limit) = clip::clip_limit(clip_limit, tile_pixels) {
                clip::clip_histogram(&mut hist, limit);
            }
            cdf::mapping(&hist, tile_pixels)
        })
        .collect()
}

/// Equalize a single-channel plane of `width x height` pixels.
///
/// `clip_limit <= 0` disables contrast limiting. A 1x1 grid is plain
/// histogram equalization.
pub fn clahe(
    gray: &[u8],
    width: u32,
    height: u32,
    clip_limit: f64,
    shape: GridShape,
) -> Result<Vec<u8>, EnhanceError> {
    if width == 0 || height == 0 {
        return Err(EnhanceError::EmptyImage { width, height });
    }
    let grid = TileGrid::new(width, height, shape)?;
    let expected = width as usize * height as usize;
    if gray.len() != expected {
        return Err(EnhanceError::BufferSize {
            expected,
            actual: gray.len(),
        });
    }

    debug!(width, height, grid = %shape, clip_limit, "computing tile LUTs");
    let luts = tile_luts(gray, &grid, clip_limit);

    debug!(tiles = luts.len(), "interpolating tile LUTs");
    Ok(interpolate::interpolate(gray, &grid, &luts))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Global histogram equalization without tiling or clipping.
    fn plain_equalize(gray: &[u8]) -> Vec<u8> {
        let mut hist = [0u64; 256];
        for &v in gray {
            hist[v as usize] += 1;
        }
        let n = gray.len() as u64;
        let mut lut = [0u8; 256];
        let mut cdf = 0u64;
        for i in 0..256 {
            cdf += hist[i];
            lut[i] = ((cdf * 255 + n / 2) / n) as u8;
        }
        gray.iter().map(|&v| lut[v as usize]).collect()
    }

    #[test]
    fn test_uniform_image() {
        // A uniform image should remain uniform after CLAHE
        let gray = vec![128u8; 64 * 64];
        let result = clahe(&gray, 64, 64, 4.0, GridShape::new(8, 8)).unwrap();
        let first = result[0];
        assert!(result.iter().all(|&v| v == first));
    }

    #[test]
    fn test_single_tile_matches_plain_equalization() {
        let gray: Vec<u8> = (0..37 * 23)
            .map(|i| ((i * 7919) % 97 + (i % 5) * 20) as u8)
            .collect();
        let result = clahe(&gray, 37, 23, 0.0, GridShape::new(1, 1)).unwrap();
        assert_eq!(result, plain_equalize(&gray));
    }

    #[test]
    fn test_output_dimensions_preserved() {
        let gray: Vec<u8> = (0..13 * 7).map(|i| (i * 3) as u8).collect();
        let result = clahe(&gray, 13, 7, 2.0, GridShape::new(3, 4)).unwrap();
        assert_eq!(result.len(), 13 * 7);
    }

    #[test]
    fn test_grid_larger_than_image() {
        // Only the last tile on each axis holds pixels; the empty ones must
        // not leak their identity LUTs into the output.
        let row = [10u8, 20, 30];
        let result = clahe(&row, 3, 1, 0.0, GridShape::new(1, 8)).unwrap();
        assert_eq!(result, clahe(&row, 3, 1, 0.0, GridShape::new(1, 1)).unwrap());
        assert_eq!(result, vec![85, 170, 255]);

        let gray = [10u8, 200, 90, 40, 250, 0];
        let result = clahe(&gray, 3, 2, 2.0, GridShape::new(4, 8)).unwrap();
        assert_eq!(result, clahe(&gray, 3, 2, 2.0, GridShape::new(1, 1)).unwrap());
    }

    #[test]
    fn test_boundary_continuity_on_gradient() {
        // Intensity steps fall mid-tile (x, y = 8, 24, 40, 56), so pixels on
        // either side of each tile edge share the same input value.
        let (w, h) = (64usize, 64usize);
        let gray: Vec<u8> = (0..h)
            .flat_map(|y| (0..w).map(move |x| (100 + (x + 8) / 16 + (y + 8) / 16) as u8))
            .collect();
        let out = clahe(&gray, w as u32, h as u32, 2.0, GridShape::new(4, 4)).unwrap();

        for edge in [16usize, 32, 48] {
            for i in 0..w {
                let across_x = out[i * w + edge - 1].abs_diff(out[i * w + edge]);
                let across_y = out[(edge - 1) * w + i].abs_diff(out[edge * w + i]);
                assert!(across_x <= 1, "seam at x={} row {}: {}", edge, i, across_x);
                assert!(across_y <= 1, "seam at y={} col {}: {}", edge, i, across_y);
            }
        }
    }

    #[test]
    fn test_tile_edges_no_harsher_than_interior() {
        // Smooth ramp, so values differ across every tile edge
        let (w, h) = (64usize, 64usize);
        let gray: Vec<u8> = (0..h)
            .flat_map(|y| (0..w).map(move |x| (60 + x / 2 + y / 4) as u8))
            .collect();
        let out = clahe(&gray, w as u32, h as u32, 2.0, GridShape::new(4, 4)).unwrap();

        let is_edge = |i: usize| i % 16 == 0;
        let (mut edge_jump, mut inner_jump) = (0u8, 0u8);
        for y in 0..h {
            for x in 1..w {
                let d = out[y * w + x].abs_diff(out[y * w + x - 1]);
                let max = if is_edge(x) { &mut edge_jump } else { &mut inner_jump };
                *max = (*max).max(d);
            }
        }
        for y in 1..h {
            for x in 0..w {
                let d = out[y * w + x].abs_diff(out[(y - 1) * w + x]);
                let max = if is_edge(y) { &mut edge_jump } else { &mut inner_jump };
                *max = (*max).max(d);
            }
        }
        assert!(inner_jump > 0);
        assert!(
            edge_jump <= inner_jump,
            "edge jump {} exceeds interior jump {}",
            edge_jump,
            inner_jump
        );
    }

    #[test]
    fn test_low_contrast_is_stretched() {
        // Dark, narrow-range input should spread out
        let gray: Vec<u8> = (0..64 * 64).map(|i| 20 + (i % 64) as u8 / 8).collect();
        let result = clahe(&gray, 64, 64, 0.0, GridShape::new(2, 2)).unwrap();
        let min = *result.iter().min().unwrap();
        let max = *result.iter().max().unwrap();
        assert!(max - min > 100);
        assert_eq!(max, 255);
    }

    #[test]
    fn test_invalid_inputs() {
        let gray = vec![0u8; 16];
        assert_eq!(
            clahe(&gray, 4, 4, 2.0, GridShape::new(0, 4)),
            Err(EnhanceError::InvalidGrid { rows: 0, cols: 4 })
        );
        assert_eq!(
            clahe(&[], 0, 4, 2.0, GridShape::new(2, 2)),
            Err(EnhanceError::EmptyImage {
                width: 0,
                height: 4
            })
        );
        // Empty image is reported before a bad grid, as in `enhance`
        assert_eq!(
            clahe(&[], 0, 4, 2.0, GridShape::new(0, 4)),
            Err(EnhanceError::EmptyImage {
                width: 0,
                height: 4
            })
        );
        assert_eq!(
            clahe(&gray, 4, 3, 2.0, GridShape::new(2, 2)),
            Err(EnhanceError::BufferSize {
                expected: 12,
                actual: 16
            })
        );
    }
}
