use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;

use seg_annotate::{RenderStyle, SessionConfig};

/// Draw labelled ground-truth polygons over an image.
#[derive(Parser)]
#[command(name = "seg-annotate")]
#[command(version, about)]
struct Cli {
    /// Image to segment.
    image: PathBuf,

    /// Existing directory for the overlay PNG and the JSON record.
    output_dir: PathBuf,

    /// TrueType/OpenType font for labels (defaults to the bundled font).
    #[arg(long)]
    font: Option<PathBuf>,

    /// Label glyph height in pixels.
    #[arg(long, default_value_t = 32.0, value_parser = parse_positive_scale)]
    label_scale: f32,

    /// Ask before ending drawing while a shape is still uncommitted.
    #[arg(long)]
    confirm_discard: bool,

    /// Initial window width.
    #[arg(long, default_value_t = 1200.0)]
    width: f32,

    /// Initial window height.
    #[arg(long, default_value_t = 800.0)]
    height: f32,
}

fn parse_positive_scale(s: &str) -> std::result::Result<f32, String> {
    let scale: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if scale.is_finite() && scale > 0.0 {
        Ok(scale)
    } else {
        Err(format!("label scale must be a positive number, got {s}"))
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if !cli.image.is_file() {
        bail!("image not found: {}", cli.image.display());
    }
    if !cli.output_dir.is_dir() {
        bail!("output directory not found: {}", cli.output_dir.display());
    }

    let config = SessionConfig {
        font_path: cli.font,
        confirm_discard: cli.confirm_discard,
        window_size: [cli.width, cli.height],
        style: RenderStyle {
            label_scale: cli.label_scale,
            ..RenderStyle::default()
        },
        ..SessionConfig::new(cli.image, cli.output_dir)
    };

    let completed = seg_annotate::run(config).context("export failed")?;
    if !completed {
        eprintln!("Something went wrong, nothing was exported.");
        std::process::exit(1);
    }
    Ok(())
}
