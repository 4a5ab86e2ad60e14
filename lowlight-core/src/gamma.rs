//! Gamma correction through a 256-entry lookup table.
//!
//! `v -> round(255 * (v / 255)^(1 / gamma))`, so gamma > 1 brightens and
//! gamma = 1 is the identity.

use rayon::prelude::*;

use crate::error::EnhanceError;

/// Bytes corrected per rayon task.
const PARALLEL_CHUNK: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct GammaLut {
    gamma: f64,
    table: [u8; 256],
}

impl GammaLut {
    pub fn new(gamma: f64) -> Result<Self, EnhanceError> {
        if !gamma.is_finite() || gamma <= 0.0 {
            return Err(EnhanceError::InvalidGamma(gamma));
        }

        let inv = 1.0 / gamma;
        let mut table = [0u8; 256];
        for (v, out) in table.iter_mut().enumerate() {
            let normalized = v as f64 / 255.0;
            *out = (255.0 * normalized.powf(inv) + 0.5).clamp(0.0, 255.0) as u8;
        }
        Ok(Self { gamma, table })
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn table(&self) -> &[u8; 256] {
        &self.table
    }

    #[inline]
    pub fn map(&self, v: u8) -> u8 {
        self.table[v as usize]
    }

    /// Correct every byte of an interleaved buffer in place, all channels alike.
    pub fn apply(&self, data: &mut [u8]) {
        data.par_chunks_mut(PARALLEL_CHUNK).for_each(|chunk| {
            for v in chunk {
                *v = self.table[*v as usize];
            }
        });
    }
}
