use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use sbmodel_core::ModelBuilder;

use crate::config;

#[derive(Args)]
pub struct InfoArgs {
    /// Model configuration file
    pub config: PathBuf,

    /// Print the parsed configuration as TOML instead of the summary
    #[arg(long)]
    pub dump_toml: bool,
}

/// Parse a configuration and report the parameter count and labels, the
/// contract an external optimizer would pull from the core at startup.
pub fn run(args: &InfoArgs) -> Result<()> {
    let text = std::fs::read_to_string(&args.config)
        .with_context(|| format!("failed to read {}", args.config.display()))?;
    let parsed = config::parse(&text)?;

    if args.dump_toml {
        print!("{}", config::to_toml(&parsed)?);
        return Ok(());
    }

    let (width, height) = (parsed.width.unwrap_or(0), parsed.height.unwrap_or(0));
    let model = ModelBuilder::configure(
        width.max(1),
        height.max(1),
        parsed.components.clone(),
        None,
        vec![],
        parsed.zp,
    )
    .context("invalid model configuration")?;

    println!("File:       {}", args.config.display());
    println!("ZP:         {}", parsed.zp);
    if let (Some(w), Some(h)) = (parsed.width, parsed.height) {
        println!("Geometry:   {w}x{h}");
    } else {
        println!("Geometry:   (not declared, render requires --width/--height)");
    }
    println!("Components: {}", parsed.components.len());
    for descriptor in &parsed.components {
        println!("  - {} ({} params)", descriptor.kind, descriptor.params.len());
    }
    println!("Parameters: {}", model.n_params());
    for label in model.parameter_labels() {
        println!("  - {label}");
    }

    Ok(())
}
