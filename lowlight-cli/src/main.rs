use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use lowlight_core::batch::{enhance_dir, enhance_file, is_image_file, BatchOutcome};
use lowlight_core::{EnhanceParams, GridShape};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Env var holding the log filter (tracing `EnvFilter` syntax).
const LOG_ENV: &str = "LOWLIGHT_LOG";

#[derive(Parser)]
#[command(
    name = "lowlight",
    about = "Brighten low-light images with CLAHE and gamma correction"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enhance a single image
    Single {
        /// Input image path
        input: PathBuf,

        /// Output image path (default: <input>_enhanced.<ext>)
        output: Option<PathBuf>,

        #[command(flatten)]
        tuning: Tuning,
    },

    /// Enhance every image in a directory
    Batch {
        /// Input directory
        input_dir: PathBuf,

        /// Output directory (default: input_dir/output)
        output_dir: Option<PathBuf>,

        #[command(flatten)]
        tuning: Tuning,

        /// Number of parallel jobs (default: num_cpus)
        #[arg(long, short)]
        jobs: Option<usize>,

        /// Reprocess even if output is up-to-date
        #[arg(long)]
        force: bool,
    },

    /// List the named parameter presets
    Presets,
}

#[derive(Args)]
struct Tuning {
    /// Named preset: balanced, mild, strong, fine (default: balanced)
    #[arg(long)]
    preset: Option<String>,

    /// Gamma; values above 1.0 brighten (overrides the preset)
    #[arg(long)]
    gamma: Option<f64>,

    /// CLAHE clip limit; 0 disables contrast limiting (overrides the preset)
    #[arg(long)]
    clip_limit: Option<f64>,

    /// CLAHE tile grid as ROWSxCOLS, e.g. 8x8 (overrides the preset)
    #[arg(long)]
    grid: Option<GridShape>,
}

impl Tuning {
    fn resolve(&self) -> Result<EnhanceParams> {
        let mut params = match &self.preset {
            Some(name) => match EnhanceParams::from_preset(name) {
                Some(p) => p,
                None => bail!(
                    "Unknown preset '{}'. Available: {}",
                    name,
                    EnhanceParams::preset_names().join(", ")
                ),
            },
            None => EnhanceParams::default(),
        };

        if let Some(gamma) = self.gamma {
            params.gamma = gamma;
        }
        if let Some(clip_limit) = self.clip_limit {
            params.clip_limit = clip_limit;
        }
        if let Some(grid) = self.grid {
            params.grid = grid;
        }

        // Fail on bad parameters before touching any file
        params.validate(1, 1)?;
        Ok(params)
    }
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    let ext = input.extension().and_then(|e| e.to_str()).unwrap_or("png");
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{}_enhanced.{}", stem, ext))
}

fn cmd_single(input: &Path, output: Option<&Path>, params: &EnhanceParams) -> Result<()> {
    if !is_image_file(input) {
        bail!("Not a supported image file: {}", input.display());
    }
    let output_path = output
        .map(PathBuf::from)
        .unwrap_or_else(|| default_output_path(input));

    info!(
        input = %input.display(),
        output = %output_path.display(),
        gamma = params.gamma,
        clip_limit = params.clip_limit,
        grid = %params.grid,
        "enhancing"
    );

    enhance_file(input, &output_path, params)
        .with_context(|| format!("failed to enhance {}", input.display()))?;
    info!(output = %output_path.display(), "done");
    Ok(())
}

fn cmd_batch(
    input_dir: &Path,
    output_dir: &Path,
    params: &EnhanceParams,
    jobs: Option<usize>,
    force: bool,
) -> Result<()> {
    if let Some(n) = jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .context("failed to configure thread pool")?;
    }

    info!(
        input = %input_dir.display(),
        output = %output_dir.display(),
        gamma = params.gamma,
        clip_limit = params.clip_limit,
        grid = %params.grid,
        "enhancing directory"
    );

    let report = enhance_dir(input_dir, output_dir, params, force)
        .with_context(|| format!("batch over {} failed", input_dir.display()))?;

    for outcome in &report.outcomes {
        match outcome {
            BatchOutcome::Enhanced { input, output } => {
                info!("Enhanced: {} -> {}", input.display(), output.display())
            }
            BatchOutcome::Skipped { path, reason } => {
                warn!("Skipped: {} ({})", path.display(), reason)
            }
            BatchOutcome::Failed { path, error } => {
                error!("Failed: {}: {}", path.display(), error)
            }
        }
    }

    info!(
        "Done! Enhanced: {}, Skipped: {}, Errors: {}",
        report.enhanced(),
        report.skipped(),
        report.failed()
    );

    if report.has_failures() {
        bail!("{} image(s) failed", report.failed());
    }
    Ok(())
}

fn preset_lines() -> Vec<String> {
    EnhanceParams::all_presets()
        .into_iter()
        .map(|(name, p)| {
            format!(
                "{:<10} gamma={:<4} clip_limit={:<4} grid={}",
                name, p.gamma, p.clip_limit, p.grid
            )
        })
        .collect()
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Single {
            input,
            output,
            tuning,
        } => {
            let params = tuning.resolve()?;
            cmd_single(&input, output.as_deref(), &params)?;
        }

        Commands::Batch {
            input_dir,
            output_dir,
            tuning,
            jobs,
            force,
        } => {
            let params = tuning.resolve()?;
            let output = output_dir.unwrap_or_else(|| input_dir.join("output"));
            cmd_batch(&input_dir, &output, &params, jobs, force)?;
        }

        Commands::Presets => {
            for line in preset_lines() {
                println!("{}", line);
            }
        }
    }

    Ok(())
}
