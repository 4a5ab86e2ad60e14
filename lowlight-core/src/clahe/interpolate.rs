//! Bilinear blending of tile LUTs across tile centers.
//!
//! Each pixel is mapped by up to four tile LUTs whose centers enclose it.
//! Pixels in the outer half of border tiles have no enclosing pair on one
//! or both axes and use the nearest tile(s) only.

use rayon::prelude::*;

use super::cdf::Lut;
use super::tiles::{Span, TileGrid};

/// Interpolation anchors for one pixel coordinate along an axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisSample {
    /// Tile whose center is at or before the pixel.
    pub lo: usize,
    /// Tile whose center is after the pixel (equal to `lo` on the border).
    pub hi: usize,
    /// Weight of `hi`, in `[0, 1)`.
    pub t: f64,
}

/// Precompute anchors for every pixel coordinate in `0..extent`.
///
/// Empty spans (more tiles than pixels on the axis) are never anchors, so a
/// pixel only blends tiles that actually contain pixels.
pub fn axis_samples(spans: &[Span], extent: usize) -> Vec<AxisSample> {
    let anchors: Vec<(usize, f64)> = spans
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.is_empty())
        .map(|(i, s)| (i, s.center()))
        .collect();
    if anchors.is_empty() {
        return Vec::new();
    }
    let (first, last) = (anchors[0], anchors[anchors.len() - 1]);

    let mut samples = Vec::with_capacity(extent);
    let mut k = 0usize;
    for p in 0..extent {
        let p = p as f64;
        if p <= first.1 {
            samples.push(AxisSample {
                lo: first.0,
                hi: first.0,
                t: 0.0,
            });
        } else if p >= last.1 {
            samples.push(AxisSample {
                lo: last.0,
                hi: last.0,
                t: 0.0,
            });
        } else {
            // anchors[k].1 <= p < last.1 holds here
            while anchors[k + 1].1 <= p {
                k += 1;
            }
            let (lo, hi) = (anchors[k], anchors[k + 1]);
            let t = (p - lo.1) / (hi.1 - lo.1);
            samples.push(AxisSample {
                lo: lo.0,
                hi: hi.0,
                t,
            });
        }
    }
    samples
}

/// Remap every pixel of `gray` through the bilinear blend of its tiles' LUTs.
///
/// `luts` holds one table per tile in row-major order.
pub fn interpolate(gray: &[u8], grid: &TileGrid, luts: &[Lut]) -> Vec<u8> {
    let w = grid.width();
    let h = grid.height();
    debug_assert_eq!(gray.len(), w * h);
    debug_assert_eq!(luts.len(), grid.shape().tile_count());

    let col_samples = axis_samples(grid.col_spans(), w);
    let row_samples = axis_samples(grid.row_spans(), h);

    let mut output = vec![0u8; w * h];
    output
        .par_chunks_mut(w)
        .zip(gray.par_chunks(w))
        .zip(row_samples.par_iter())
        .for_each(|((out_row, src_row), ys)| {
            let top = grid.index(ys.lo, 0);
            let bottom = grid.index(ys.hi, 0);

            for ((out, &val), xs) in out_row.iter_mut().zip(src_row).zip(&col_samples) {
                let val = val as usize;
                let tl = luts[top + xs.lo][val] as f64;
                let tr = luts[top + xs.hi][val] as f64;
                let bl = luts[bottom + xs.lo][val] as f64;
                let br = luts[bottom + xs.hi][val] as f64;

                let upper = tl * (1.0 - xs.t) + tr * xs.t;
                let lower = bl * (1.0 - xs.t) + br * xs.t;
                let result = upper * (1.0 - ys.t) + lower * ys.t;

                *out = (result + 0.5).clamp(0.0, 255.0) as u8;
            }
        });

    output
}
