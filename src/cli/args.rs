//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// krel - GrapheneOS kernel release pipeline
///
/// Resolves upstream versions, persists a deterministic build identity,
/// gates the kernel build behind already-published releases, and
/// publishes tagged releases with idempotent asset uploads.
#[derive(Parser, Debug)]
#[command(name = "krel")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands, one per pipeline stage
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve dependency versions and write the build metadata file
    Metadata(MetadataArgs),

    /// Check whether this release is already fully published (exit 2 = skip)
    Gate(GateArgs),

    /// Create the tagged release and upload artifacts
    Publish(PublishArgs),

    /// Print a persisted build identity as KEY=value lines
    Env(EnvArgs),
}

/// Arguments for the metadata command
#[derive(Parser, Debug)]
pub struct MetadataArgs {
    /// Target device id
    pub device: String,

    /// Source repository (owner/name) the kernel is built from
    pub repo: String,

    /// Ref the pipeline is building
    pub ref_name: String,

    /// Directory the metadata file is written to
    pub output_dir: PathBuf,

    /// Directory containing device profiles
    #[arg(long, default_value = "devices")]
    pub profiles_dir: PathBuf,
}

/// Arguments for the gate command
#[derive(Parser, Debug)]
pub struct GateArgs {
    /// Metadata file written by the metadata stage
    pub metadata_file: PathBuf,
}

/// Arguments for the publish command
#[derive(Parser, Debug)]
pub struct PublishArgs {
    /// Metadata file written by the metadata stage
    pub metadata_file: PathBuf,

    /// Kernel artifact to upload
    pub artifact: PathBuf,

    /// GitHub token used for release writes
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

/// Arguments for the env command
#[derive(Parser, Debug)]
pub struct EnvArgs {
    /// Metadata file written by the metadata stage
    pub metadata_file: PathBuf,
}
