//! Contrast limiting: cap histogram bins and spread the excess.

use super::tiles::Histogram;

/// Per-tile bin limit for a clip-limit factor, or `None` when clipping is off.
///
/// The limit is `clip_limit * tile_pixels / 256`, truncated, never below 1.
/// Non-positive (and NaN) factors disable clipping.
pub fn clip_limit(clip_limit: f64, tile_pixels: usize) -> Option<u32> {
    if clip_limit.is_nan() || clip_limit <= 0.0 {
        return None;
    }
    let limit = (clip_limit * tile_pixels as f64 / 256.0).max(1.0);
    Some(limit.min(u32::MAX as f64) as u32)
}

/// Clip bins at `limit` and redistribute the excess in a single pass.
///
/// The excess is split evenly (`excess / 256` per bin, truncated). The
/// residual `excess % 256` goes one count at a time to bins spaced
/// `256 / residual` apart starting at bin 0. Total mass is preserved exactly;
/// bins may end up slightly above `limit`.
pub fn clip_histogram(hist: &mut Histogram, limit: u32) {
    let mut excess = 0u64;
    for bin in hist.iter_mut() {
        if *bin > limit {
            excess += (*bin - limit) as u64;
            *bin = limit;
        }
    }

    if excess == 0 {
        return;
    }

    let avg_inc = (excess / 256) as u32;
    let mut residual = (excess % 256) as usize;

    if avg_inc > 0 {
        for bin in hist.iter_mut() {
            *bin += avg_inc;
        }
    }

    if residual > 0 {
        let step = (256 / residual).max(1);
        let mut i = 0;
        while residual > 0 && i < 256 {
            hist[i] += 1;
            residual -= 1;
            i += step;
        }
    }
}
