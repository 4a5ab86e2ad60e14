//! Folder batch driver around the enhancement core.
//!
//! Every directory entry yields a [`BatchOutcome`]; nothing is printed here,
//! callers decide how to report.

use image::{DynamicImage, ImageError};
use rayon::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::EnhanceError;
use crate::pipeline::{enhance_gray, enhance_rgb, EnhanceParams};

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "tif", "tiff"];

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Input and output directory are the same: {}", .0.display())]
    SameDirectory(PathBuf),

    #[error("Image codec error: {0}")]
    Image(#[from] ImageError),

    #[error(transparent)]
    Enhance(#[from] EnhanceError),
}

impl BatchError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotAnImage,
    UpToDate,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotAnImage => write!(f, "not an image file"),
            SkipReason::UpToDate => write!(f, "output is up to date"),
        }
    }
}

/// Result of processing one directory entry.
#[derive(Debug)]
pub enum BatchOutcome {
    Enhanced { input: PathBuf, output: PathBuf },
    Skipped { path: PathBuf, reason: SkipReason },
    Failed { path: PathBuf, error: BatchError },
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<BatchOutcome>,
}

impl BatchReport {
    pub fn enhanced(&self) -> usize {
        self.count(|o| matches!(o, BatchOutcome::Enhanced { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, BatchOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, BatchOutcome::Failed { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    fn count(&self, pred: impl Fn(&BatchOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Enhance a decoded image. Grayscale sources stay grayscale; everything
/// else goes through the RGB path (alpha is dropped).
pub fn enhance_image(
    img: &DynamicImage,
    params: &EnhanceParams,
) -> Result<DynamicImage, EnhanceError> {
    if img.color().has_color() {
        enhance_rgb(&img.to_rgb8(), params).map(DynamicImage::ImageRgb8)
    } else {
        enhance_gray(&img.to_luma8(), params).map(DynamicImage::ImageLuma8)
    }
}

/// Decode `input`, enhance it and encode to `output` (format from extension).
pub fn enhance_file(input: &Path, output: &Path, params: &EnhanceParams) -> Result<(), BatchError> {
    let img = image::open(input)?;
    let enhanced = enhance_image(&img, params)?;
    enhanced.save(output)?;
    Ok(())
}

/// True when `output` exists and is newer than `input`.
fn is_up_to_date(input: &Path, output: &Path) -> bool {
    let modified = |p: &Path| p.metadata().and_then(|m| m.modified()).ok();
    match (modified(input), modified(output)) {
        (Some(in_time), Some(out_time)) => out_time > in_time,
        _ => false,
    }
}

/// Enhance every image in `input_dir` into `output_dir`, keeping file names.
///
/// Directory-level failures (unreadable input dir, uncreatable output dir)
/// are returned as errors; per-file problems become outcomes.
pub fn enhance_dir(
    input_dir: &Path,
    output_dir: &Path,
    params: &EnhanceParams,
    force: bool,
) -> Result<BatchReport, BatchError> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(input_dir)
        .map_err(|e| BatchError::io(input_dir, e))?
        .filter_map(|entry| entry.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    entries.sort();

    // A missing output dir cannot be the (existing) input dir
    let same = match (input_dir.canonicalize(), output_dir.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    };
    if same {
        return Err(BatchError::SameDirectory(output_dir.to_path_buf()));
    }

    std::fs::create_dir_all(output_dir).map_err(|e| BatchError::io(output_dir, e))?;

    debug!(
        count = entries.len(),
        input = %input_dir.display(),
        output = %output_dir.display(),
        "batch start"
    );

    let outcomes = entries
        .into_par_iter()
        .map(|path| {
            if !is_image_file(&path) {
                return BatchOutcome::Skipped {
                    path,
                    reason: SkipReason::NotAnImage,
                };
            }

            let output = match path.file_name() {
                Some(name) => output_dir.join(name),
                None => {
                    return BatchOutcome::Skipped {
                        path,
                        reason: SkipReason::NotAnImage,
                    }
                }
            };

            if !force && is_up_to_date(&path, &output) {
                return BatchOutcome::Skipped {
                    path,
                    reason: SkipReason::UpToDate,
                };
            }

            match enhance_file(&path, &output, params) {
                Ok(()) => BatchOutcome::Enhanced {
                    input: path,
                    output,
                },
                Err(error) => BatchOutcome::Failed { path, error },
            }
        })
        .collect();

    Ok(BatchReport { outcomes })
}
