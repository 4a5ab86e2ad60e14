//! Tile grid partitioning and per-tile histograms.
//!
//! Tiles along an axis share a base size of `extent / parts`; the last tile
//! absorbs the remainder so every pixel lands in exactly one tile.

use rayon::prelude::*;
use std::fmt;
use std::str::FromStr;

use crate::error::EnhanceError;

/// 256-bin intensity histogram of one tile.
pub type Histogram = [u32; 256];

/// Number of tiles along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridShape {
    pub rows: usize,
    pub cols: usize,
}

impl GridShape {
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    pub fn validate(self) -> Result<Self, EnhanceError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(EnhanceError::InvalidGrid {
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(self)
    }

    pub fn tile_count(self) -> usize {
        self.rows * self.cols
    }
}

impl Default for GridShape {
    fn default() -> Self {
        Self::new(8, 8)
    }
}

impl fmt::Display for GridShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

impl FromStr for GridShape {
    type Err = String;

    /// Parse "ROWSxCOLS" (e.g. "8x8") or a single number for a square grid.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |part: &str| {
            part.trim()
                .parse::<usize>()
                .map_err(|_| format!("Invalid grid '{}': expected ROWSxCOLS, e.g. 8x8", s))
        };
        let shape = match s.split_once(|c: char| c == 'x' || c == 'X') {
            Some((rows, cols)) => Self::new(parse(rows)?, parse(cols)?),
            None => {
                let n = parse(s)?;
                Self::new(n, n)
            }
        };
        shape.validate().map_err(|e| e.to_string())
    }
}

/// Half-open pixel range `[start, end)` covered by a tile along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn len(self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// Center in pixel-center coordinates. Empty spans sit half a pixel
    /// before their start.
    pub fn center(self) -> f64 {
        (self.start + self.end) as f64 / 2.0 - 0.5
    }
}

/// Split `extent` pixels into `parts` spans, the last one taking the remainder.
pub fn spans(extent: usize, parts: usize) -> Vec<Span> {
    let base = extent / parts;
    (0..parts)
        .map(|i| {
            let start = i * base;
            let end = if i == parts - 1 { extent } else { start + base };
            Span { start, end }
        })
        .collect()
}

/// A `rows x cols` partition of a `width x height` plane.
#[derive(Debug, Clone)]
pub struct TileGrid {
    width: usize,
    height: usize,
    row_spans: Vec<Span>,
    col_spans: Vec<Span>,
}

impl TileGrid {
    pub fn new(width: u32, height: u32, shape: GridShape) -> Result<Self, EnhanceError> {
        let shape = shape.validate()?;
        let (width, height) = (width as usize, height as usize);
        Ok(Self {
            width,
            height,
            row_spans: spans(height, shape.rows),
            col_spans: spans(width, shape.cols),
        })
    }

    pub fn shape(&self) -> GridShape {
        GridShape::new(self.row_spans.len(), self.col_spans.len())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn row_spans(&self) -> &[Span] {
        &self.row_spans
    }

    pub fn col_spans(&self) -> &[Span] {
        &self.col_spans
    }

    /// Row-major index of tile `(row, col)`.
    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.col_spans.len() + col
    }

    pub fn tile_pixels(&self, row: usize, col: usize) -> usize {
        self.row_spans[row].len() * self.col_spans[col].len()
    }

    /// Count intensities of the pixels inside tile `(row, col)`.
    pub fn histogram(&self, gray: &[u8], row: usize, col: usize) -> Histogram {
        debug_assert_eq!(gray.len(), self.width * self.height);
        let rows = self.row_spans[row];
        let cols = self.col_spans[col];

        let mut hist = [0u32; 256];
        for y in rows.start..rows.end {
            let line = &gray[y * self.width + cols.start..y * self.width + cols.end];
            for &v in line {
                hist[v as usize] += 1;
            }
        }
        hist
    }

    /// Histograms of every tile in row-major order.
    pub fn histograms(&self, gray: &[u8]) -> Vec<Histogram> {
        let cols = self.col_spans.len();
        (0..self.shape().tile_count())
            .into_par_iter()
            .map(|idx| self.histogram(gray, idx / cols, idx % cols))
            .collect()
    }
}
