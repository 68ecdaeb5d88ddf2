//! Gate command - decide whether the kernel build can be skipped

use crate::cli::args::GateArgs;
use crate::error::KrelResult;
use crate::metadata::{BuildMetadata, DEVICE_ID_KEY, GRAPHENEOS_VERSION_KEY};
use crate::release::gate::{should_skip, GateOutcome};
use crate::release::GithubReleases;

/// Execute the gate command
pub fn execute(args: GateArgs) -> KrelResult<GateOutcome> {
    let metadata = BuildMetadata::load(&args.metadata_file)?;
    let device = metadata.require(DEVICE_ID_KEY, &args.metadata_file)?;
    let version = metadata.require(GRAPHENEOS_VERSION_KEY, &args.metadata_file)?;
    let repo = &metadata.repo.repo_name;

    // Reads work anonymously; the gate never writes.
    let host = GithubReleases::new(None);
    let outcome = should_skip(&host, repo, device, version)?;

    if outcome == GateOutcome::Skip {
        println!("Release for {device} version {version} already exists");
    }

    Ok(outcome)
}
