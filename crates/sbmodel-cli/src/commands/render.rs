use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use console::Style;
use indicatif::{ProgressBar, ProgressStyle};
use sbmodel_core::oversample::OversampledRegionSpec;
use sbmodel_core::{params::flatten, psf::gaussian_psf, ModelBuilder, PsfKernel};

use crate::config;
use crate::image_io::{load_psf_raster, save_model_image};

#[derive(Args)]
pub struct RenderArgs {
    /// Model configuration file
    pub config: PathBuf,

    /// Output image path (.tiff or .png); format chosen from extension
    #[arg(short, long, default_value = "model.tiff")]
    pub output: PathBuf,

    /// Base image width, overriding GEOMETRY in the config
    #[arg(long)]
    pub width: Option<usize>,

    /// Base image height, overriding GEOMETRY in the config
    #[arg(long)]
    pub height: Option<usize>,

    /// Raster PSF file to convolve with (any format `image` reads)
    #[arg(long)]
    pub psf: Option<PathBuf>,

    /// Synthesize an analytic Gaussian PSF of this sigma (pixels) instead
    /// of loading one from --psf
    #[arg(long)]
    pub psf_sigma: Option<f64>,

    /// Analytic Gaussian PSF kernel size (odd number of pixels)
    #[arg(long, default_value = "9")]
    pub psf_size: usize,

    /// Optional oversampled sub-region: "row,col,width,height,factor"
    /// (base-resolution, 0-indexed); requires --oversample-psf-sigma
    #[arg(long)]
    pub oversample_region: Option<String>,

    /// Analytic Gaussian PSF sigma (pixels, oversampled scale) for the
    /// --oversample-region patch
    #[arg(long)]
    pub oversample_psf_sigma: Option<f64>,
}

pub fn run(args: &RenderArgs) -> Result<()> {
    let text = std::fs::read_to_string(&args.config)
        .with_context(|| format!("failed to read {}", args.config.display()))?;
    let parsed = config::parse(&text)?;

    let width = args
        .width
        .or(parsed.width)
        .context("image width not given on the command line or in the config (GEOMETRY)")?;
    let height = args
        .height
        .or(parsed.height)
        .context("image height not given on the command line or in the config (GEOMETRY)")?;

    let psf = build_psf(args)?;
    let oversample_specs = build_oversample_specs(args)?;

    let params = flatten(
        &parsed
            .components
            .iter()
            .map(|d| d.params.clone())
            .collect::<Vec<_>>(),
    );

    let mut model = ModelBuilder::configure(
        width,
        height,
        parsed.components.clone(),
        psf,
        oversample_specs,
        parsed.zp,
    )
    .context("invalid model configuration")?;
    model.set_parameters(&params).context("parameter rejected by a component")?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb.set_message("Synthesizing model image...");
    let result = model.compute_model_image(None);
    pb.finish_and_clear();
    result.context("model synthesis failed")?;

    print_summary(&parsed, width, height, model.diagnostics());

    save_model_image(model.image(), &args.output)?;
    println!("Saved to {}", args.output.display());

    Ok(())
}

fn build_psf(args: &RenderArgs) -> Result<Option<PsfKernel>> {
    if let Some(sigma) = args.psf_sigma {
        return Ok(Some(gaussian_psf(args.psf_size, sigma)));
    }
    if let Some(path) = &args.psf {
        let weights = load_psf_raster(path)?;
        return Ok(Some(PsfKernel::from_array(weights)?));
    }
    Ok(None)
}

fn build_oversample_specs(args: &RenderArgs) -> Result<Vec<OversampledRegionSpec>> {
    let Some(spec_str) = &args.oversample_region else {
        return Ok(vec![]);
    };
    let sigma = args
        .oversample_psf_sigma
        .context("--oversample-region requires --oversample-psf-sigma")?;

    let parts: Vec<usize> = spec_str
        .split(',')
        .map(|s| s.trim().parse())
        .collect::<std::result::Result<_, _>>()
        .context("--oversample-region must be 'row,col,width,height,factor'")?;
    let [row, col, width, height, factor] = parts
        .try_into()
        .map_err(|_| anyhow::anyhow!("--oversample-region must have exactly 5 fields"))?;

    Ok(vec![OversampledRegionSpec {
        row_start: row,
        col_start: col,
        width,
        height,
        oversample: factor,
        psf: gaussian_psf(9 * factor.max(1), sigma * factor as f64),
    }])
}

fn print_summary(
    parsed: &config::ParsedConfig,
    width: usize,
    height: usize,
    diagnostics: &sbmodel_core::ModelDiagnostics,
) {
    let title = Style::new().cyan().bold();
    let label = Style::new().dim();
    let value = Style::new().bold().white();
    let warn = Style::new().yellow();

    println!();
    println!("  {}", title.apply_to("Surface-Brightness Model"));
    println!("  {}", "=".repeat(28));
    println!("  {} {}x{}", label.apply_to("Geometry:"), value.apply_to(width), value.apply_to(height));
    println!("  {} {}", label.apply_to("ZP:"), value.apply_to(parsed.zp));
    println!("  {} {}", label.apply_to("Components:"), value.apply_to(parsed.components.len()));
    if diagnostics.non_converged_pixels > 0 {
        println!(
            "  {} {}",
            warn.apply_to("Non-converged pixels:"),
            diagnostics.non_converged_pixels
        );
    }
    if diagnostics.non_finite {
        println!("  {}", warn.apply_to("Warning: output contains non-finite pixels"));
    }
    println!();
}
