// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Warpsynth — ground-truth synthesis for warped-document samples
//
// Entry point. Initialises logging, parses the command line and dispatches to
// the field, word and dense-map generators.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

/// Ground-truth generation for document dewarping datasets.
#[derive(Parser, Debug)]
#[command(name = "warpsynth", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract named field boxes from a colour-tagged template rendering.
    Fields {
        /// Colour-tagged rendering of the template
        #[arg(long)]
        template: PathBuf,

        /// JSON layout: container colour -> field colour -> field name
        #[arg(long)]
        layout: PathBuf,

        /// JSON object binding field names to their values
        #[arg(long)]
        values: Option<PathBuf>,

        /// Where to write the field records
        #[arg(short, long)]
        output: PathBuf,

        /// Image to draw the extracted boxes on
        #[arg(long, requires = "preview")]
        background: Option<PathBuf>,

        /// Where to write the overlay image
        #[arg(long, requires = "background")]
        preview: Option<PathBuf>,
    },

    /// Locate the words of the first page of a PDF in raster coordinates.
    Words {
        /// Source PDF
        #[arg(long)]
        pdf: PathBuf,

        /// Raster rendering of the page; its size fixes the coordinate scale
        #[arg(long, conflicts_with_all = ["height", "width"], required_unless_present_all = ["height", "width"])]
        raster: Option<PathBuf>,

        /// Raster height in pixels
        #[arg(long, requires = "width")]
        height: Option<u32>,

        /// Raster width in pixels
        #[arg(long, requires = "height")]
        width: Option<u32>,

        /// Where to write the word records
        #[arg(short, long)]
        output: PathBuf,

        /// Where to write an overlay of the words on the raster
        #[arg(long, requires = "raster")]
        preview: Option<PathBuf>,
    },

    /// Derive backward map, curvature, angle and text-mask archives.
    Maps {
        /// Sample directory holding the renderer outputs
        #[arg(long)]
        sample_dir: PathBuf,

        /// JSON sample configuration
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory for PNG previews of the maps
        #[arg(long)]
        preview_dir: Option<PathBuf>,

        /// Longer side of each preview image
        #[arg(long, default_value_t = 512)]
        preview_size: u32,
    },

    /// Produce all ground truth of a sample directory.
    Sample {
        /// Sample directory holding the renderer outputs
        #[arg(long)]
        sample_dir: PathBuf,

        /// JSON layout of the template
        #[arg(long)]
        layout: PathBuf,

        /// JSON object binding field names to their values
        #[arg(long)]
        values: Option<PathBuf>,

        /// JSON sample configuration
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check the map archives of a sample against its manifest.
    Verify {
        /// Sample directory holding a ground-truth manifest
        #[arg(long)]
        sample_dir: PathBuf,
    },
}

fn run(cli: Cli) -> warpsynth_core::error::Result<()> {
    match cli.command {
        Command::Fields {
            template,
            layout,
            values,
            output,
            background,
            preview,
        } => {
            let overlay = background.zip(preview);
            commands::fields(&template, &layout, values.as_deref(), &output, overlay)
        }
        Command::Words {
            pdf,
            raster,
            height,
            width,
            output,
            preview,
        } => {
            let target = match (raster, height.zip(width)) {
                (Some(path), _) => commands::RasterTarget::Image(path),
                (None, Some((height, width))) => commands::RasterTarget::Size { height, width },
                (None, None) => {
                    return Err(warpsynth_core::WarpsynthError::Config(
                        "either --raster or --height and --width is required".to_string(),
                    ));
                }
            };
            commands::words(&pdf, &target, &output, preview.as_deref())
        }
        Command::Maps {
            sample_dir,
            config,
            preview_dir,
            preview_size,
        } => {
            let config = commands::load_config(config.as_deref())?;
            commands::maps(&sample_dir, &config, preview_dir.as_deref(), preview_size)
        }
        Command::Sample {
            sample_dir,
            layout,
            values,
            config,
        } => {
            let config = commands::load_config(config.as_deref())?;
            commands::sample(&sample_dir, &layout, values.as_deref(), &config)
        }
        Command::Verify { sample_dir } => commands::verify(&sample_dir),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    tracing::info!("Warpsynth starting");

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
