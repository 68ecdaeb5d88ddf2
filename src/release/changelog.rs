//! Release changelog rendering
//!
//! Commits are re-resolved at publish time, so the changelog reflects
//! upstream state as of publish, which can trail or lead the build-time
//! snapshot recorded in the metadata file.

use crate::resolve::ResolvedCommit;

/// Release-notes anchor on grapheneos.org: final character becomes '0'
pub fn anchor(version: &str) -> String {
    let mut anchor = version.to_string();
    anchor.pop();
    anchor.push('0');
    anchor
}

/// Render the release description
pub fn render(src_repo: &str, version: &str, commits: &[ResolvedCommit]) -> String {
    let dependency_text = commits
        .iter()
        .map(|commit| format!("{}: {}", commit.repo_name, commit.web_url))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Kernel + modules for [GrapheneOS {version}](https://grapheneos.org/releases#{}).\n\n\
         {dependency_text}\n\n\
         Built using {src_repo}@{version}",
        anchor(version)
    )
}
