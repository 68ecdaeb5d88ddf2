//! GitHub commit listing backend

use crate::error::{KrelError, KrelResult};
use crate::http;
use crate::resolve::{ResolvedCommit, VersionBackend};
use serde::Deserialize;
use tracing::debug;
use ureq::Agent;

const API_BASE: &str = "https://api.github.com";

/// Resolves the tip of a ref via the GitHub commits API
pub struct GithubCommits {
    agent: Agent,
}

impl GithubCommits {
    pub fn new() -> Self {
        Self {
            agent: http::agent(),
        }
    }
}

impl Default for GithubCommits {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct CommitEntry {
    sha: String,
    html_url: String,
}

impl VersionBackend for GithubCommits {
    fn latest_commit(&self, repo_name: &str, ref_name: &str) -> KrelResult<ResolvedCommit> {
        let url = format!("{API_BASE}/repos/{repo_name}/commits");
        debug!("Listing commits for {}@{}", repo_name, ref_name);

        let mut response = self
            .agent
            .get(&url)
            .query("sha", ref_name)
            .header("accept", "application/vnd.github+json")
            .call()?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(KrelError::ResolutionFailed {
                repo: repo_name.to_string(),
                ref_name: ref_name.to_string(),
                status,
                body: http::body_text(&mut response),
            });
        }

        let body = response
            .body_mut()
            .read_to_string()
            .map_err(KrelError::Transport)?;
        let commits: Vec<CommitEntry> =
            serde_json::from_str(&body).map_err(|e| KrelError::ResolutionFailed {
                repo: repo_name.to_string(),
                ref_name: ref_name.to_string(),
                status,
                body: format!("malformed response: {e}"),
            })?;

        let head = commits
            .into_iter()
            .next()
            .ok_or_else(|| KrelError::EmptyHistory {
                repo: repo_name.to_string(),
                ref_name: ref_name.to_string(),
            })?;

        let short_id = head.sha.get(..7).unwrap_or(head.sha.as_str()).to_string();

        Ok(ResolvedCommit {
            repo_name: repo_name.to_string(),
            short_id,
            id: head.sha,
            web_url: head.html_url,
        })
    }
}
