//! Live2D bridge CLI
//!
//! Check model assets and replay control-plane scripts against a headless view.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use live2d_core::BridgeConfig;
use live2d_platform::SurfaceSize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod check;
mod headless;
mod model;
mod replay;

use replay::ReplayOptions;

#[derive(Parser)]
#[command(name = "live2d")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Live2D bridge tools", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a model settings file and the assets it references
    Check {
        /// Path to the .model3.json file
        model: PathBuf,
    },

    /// Replay a JSON-lines script of method calls against a headless view
    Replay {
        /// Script file
        script: PathBuf,

        /// Directory model paths are resolved against (defaults to the script's directory)
        #[arg(long)]
        assets: Option<PathBuf>,

        /// Frames to run after the last step
        #[arg(short, long, default_value = "1")]
        frames: u32,

        /// Surface width in pixels
        #[arg(long, default_value = "1080")]
        width: u32,

        /// Surface height in pixels
        #[arg(long, default_value = "1920")]
        height: u32,

        /// Bridge configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective bridge configuration
    Config {
        /// Bridge configuration (TOML)
        path: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Check { model } => cmd_check(&model),

        Commands::Replay {
            script,
            assets,
            frames,
            width,
            height,
            config,
            json,
        } => {
            let asset_root = match assets {
                Some(dir) => dir,
                None => script
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from(".")),
            };
            let options = ReplayOptions {
                asset_root,
                surface: SurfaceSize::new(width, height),
                trailing_frames: frames,
                config: load_config(config.as_deref())?,
            };
            cmd_replay(&script, &options, json)
        }

        Commands::Config { path } => cmd_config(path.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> Result<BridgeConfig> {
    match path {
        Some(path) => BridgeConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(BridgeConfig::default()),
    }
}

fn cmd_check(model: &Path) -> Result<()> {
    info!("Checking model {}", model.display());

    let report = check::check_model(model);
    println!("{}", report);

    if report.has_failures() {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_replay(script: &Path, options: &ReplayOptions, json: bool) -> Result<()> {
    let text = fs::read_to_string(script)
        .with_context(|| format!("Failed to read script {}", script.display()))?;

    info!(
        "Replaying {} on a {}x{} surface",
        script.display(),
        options.surface.width,
        options.surface.height
    );
    let report = replay::run(&text, options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for step in &report.steps {
        println!("{:>4}  {:<14} {}", step.line, step.step, step.result);
    }
    println!();
    for event in &report.events {
        println!("event {}", event.to_json());
    }
    println!();
    println!(
        "{} frame(s), {} draw(s), {} trigger(s)",
        report.frames,
        report.draws,
        report.triggered.len()
    );
    println!("{}", serde_json::to_string_pretty(&report.summary)?);

    let failed = report.failed_calls();
    if failed > 0 {
        warn!("{} call(s) failed", failed);
    }

    Ok(())
}

fn cmd_config(path: Option<&Path>) -> Result<()> {
    let config = load_config(path)?;
    print!("{}", config.to_toml_string()?);
    Ok(())
}
