//! Env command - re-emit a persisted build identity

use crate::cli::args::EnvArgs;
use crate::error::KrelResult;
use crate::metadata::{env_lines, BuildMetadata};

/// Execute the env command
pub fn execute(args: EnvArgs) -> KrelResult<()> {
    let metadata = BuildMetadata::load(&args.metadata_file)?;
    println!("{}", env_lines(&metadata.env));
    Ok(())
}
