//! Idempotency gate over published releases
//!
//! Decides whether the expensive kernel build can be skipped because
//! the release for this build identity is already fully published.
//! Host outages are fatal here; they must never read as "proceed".

use crate::error::KrelResult;
use crate::release::{kernel_asset_name, Release, ReleaseHost};
use tracing::debug;

/// Distinguished non-error outcome of the gate stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// No fully-published release found; the build must run
    Proceed,
    /// Release and kernel asset already exist; skip the build
    Skip,
}

/// Check the release host for an already-published kernel
pub fn should_skip(
    host: &dyn ReleaseHost,
    repo: &str,
    device: &str,
    version: &str,
) -> KrelResult<GateOutcome> {
    match host.release_by_tag(repo, version)? {
        Some(release) if has_kernel_asset(&release, device, version) => Ok(GateOutcome::Skip),
        Some(_) => {
            debug!("Release {} exists but kernel asset is missing", version);
            Ok(GateOutcome::Proceed)
        }
        None => Ok(GateOutcome::Proceed),
    }
}

/// Whether a release carries the conventionally-named kernel asset
pub fn has_kernel_asset(release: &Release, device: &str, version: &str) -> bool {
    let wanted = kernel_asset_name(device, version);
    release.assets.iter().any(|asset| asset.name == wanted)
}
