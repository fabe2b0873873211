//! # mtk
//!
//! Command-line interface for MTK motion stages.
//!
//! - `mtk run`: run a move-to stage described in TOML against a scene
//! - `mtk frames`: list the frames a scene can resolve and their poses
//!
//! Logs go to stderr; set `RUST_LOG` (e.g. `RUST_LOG=mtk_stages=debug`) for
//! more detail.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::run::DirectionArg;

/// MTK: run motion-planning stages from the command line.
#[derive(Parser)]
#[command(name = "mtk", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a move-to stage against a scene.
    Run {
        /// Scene file (robot description, start state, world objects).
        #[arg(long)]
        scene: PathBuf,
        /// Stage config file.
        #[arg(long)]
        stage: PathBuf,
        /// Propagation direction.
        #[arg(long, value_enum, default_value = "forward")]
        direction: DirectionArg,
        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List the frames a scene knows and where they are.
    Frames {
        /// Scene file.
        #[arg(long)]
        scene: PathBuf,
        /// Print the frames as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("mtk_stages=info".parse()?)
                .add_directive("mtk_scene=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Run {
            scene,
            stage,
            direction,
            json,
        } => commands::run::execute(scene, stage, *direction, *json),
        Commands::Frames { scene, json } => commands::frames::execute(scene, *json),
    }
}
