mod cmd;

use clap::{Parser, Subcommand};
use loadout_api::ComponentSpec;
use schemars::JsonSchema;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "loadout",
    version,
    about = "Assembles and validates deployable component descriptors",
    long_about = "Loadout resolves the declared dependencies of a component, verifies that no \
                  two deployable items claim overlapping install locations, scans the resolved \
                  jar set for duplicate classes, and writes the validated component descriptor."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build and write a component descriptor from a build config
    #[command(
        long_about = "Resolves, validates and assembles the component described by the build \
                            config, then writes the descriptor into the configured output directory."
    )]
    Build {
        /// Path to the JSON build config
        #[arg(value_name = "CONFIG")]
        config: PathBuf,
        /// Skip the classpath collision scan
        #[arg(long)]
        skip_class_check: bool,
        /// Deadline for the classpath scan, in seconds
        #[arg(long, value_name = "SECS")]
        scan_timeout: Option<u64>,
        /// Where to write the class collision report
        #[arg(long, value_name = "PATH")]
        class_report: Option<PathBuf>,
    },
    /// Run every validation without writing the descriptor
    #[command(
        long_about = "Runs the full resolve / path-check / class-check pipeline and reports \
                            the first failure, but persists nothing."
    )]
    Check {
        /// Path to the JSON build config
        #[arg(value_name = "CONFIG")]
        config: PathBuf,
        /// Skip the classpath collision scan
        #[arg(long)]
        skip_class_check: bool,
    },
    /// Print the JSON Schema of the build config
    Schema,
}

/// Top-level build config consumed by `loadout build` and `loadout check`.
#[derive(Deserialize, Debug, JsonSchema)]
pub struct BuildConfig {
    pub component: ComponentSpec,
    /// Artifact manifest answering every resolver query of this build.
    pub artifact_manifest: PathBuf,
    /// Directory the descriptor (and any reports) are written into.
    pub output_dir: PathBuf,
}

impl BuildConfig {
    pub fn load(path: &Path) -> loadout_core::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut config: BuildConfig = serde_json::from_str(&text)?;
        // Relative paths in the config resolve against the config file.
        if let Some(base) = path.parent() {
            if config.artifact_manifest.is_relative() {
                config.artifact_manifest = base.join(&config.artifact_manifest);
            }
            if config.output_dir.is_relative() {
                config.output_dir = base.join(&config.output_dir);
            }
        }
        Ok(config)
    }
}

pub fn run(cli: Cli) -> loadout_core::Result<()> {
    match cli.command {
        Commands::Build {
            config,
            skip_class_check,
            scan_timeout,
            class_report,
        } => cmd::build::run(&config, skip_class_check, scan_timeout, class_report),
        Commands::Check {
            config,
            skip_class_check,
        } => cmd::check::run(&config, skip_class_check),
        Commands::Schema => cmd::schema::run(),
    }
}
