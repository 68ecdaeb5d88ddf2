//! Publish command - create the tagged release and upload artifacts

use crate::cli::args::PublishArgs;
use crate::error::{KrelError, KrelResult};
use crate::metadata::{BuildMetadata, GRAPHENEOS_VERSION_KEY};
use crate::release::publish::{attach_asset, create_or_get_release};
use crate::release::{changelog, GithubReleases};
use crate::resolve::{ResolvedCommit, Resolver, VersionPins};
use console::style;

/// Execute the publish command
pub fn execute(args: PublishArgs) -> KrelResult<()> {
    let token = args
        .token
        .filter(|t| !t.is_empty())
        .ok_or(KrelError::MissingToken)?;

    let metadata = BuildMetadata::load(&args.metadata_file)?;
    let version = metadata.require(GRAPHENEOS_VERSION_KEY, &args.metadata_file)?;
    let repo = &metadata.repo.repo_name;

    // The changelog reflects upstream as of publish time, not the
    // build-time snapshot; pins do not apply here.
    let resolver = Resolver::new(VersionPins::default());
    let commits: Vec<ResolvedCommit> = metadata
        .all_dependencies()
        .map(|(backend, dep)| resolver.latest_commit(backend, dep))
        .collect::<KrelResult<_>>()?;

    let body = changelog::render(repo, version, &commits);

    let host = GithubReleases::new(Some(token));
    let release_id = create_or_get_release(&host, repo, version, &body)?;

    attach_asset(&host, repo, release_id, &args.metadata_file)?;
    attach_asset(&host, repo, release_id, &args.artifact)?;

    println!(
        "{} Release {} published",
        style("✓").green(),
        style(version).cyan()
    );

    Ok(())
}
