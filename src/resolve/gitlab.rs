//! GitLab commit listing backend

use crate::error::{KrelError, KrelResult};
use crate::http;
use crate::resolve::{ResolvedCommit, VersionBackend};
use serde::Deserialize;
use tracing::debug;
use ureq::Agent;

const API_BASE: &str = "https://gitlab.com/api/v4";

/// Resolves the tip of a ref via the GitLab repository commits API
pub struct GitlabCommits {
    agent: Agent,
}

impl GitlabCommits {
    pub fn new() -> Self {
        Self {
            agent: http::agent(),
        }
    }
}

impl Default for GitlabCommits {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct CommitEntry {
    id: String,
    short_id: String,
    web_url: String,
}

/// GitLab addresses projects by their URL-encoded full path
fn project_path(repo_name: &str) -> String {
    repo_name.replace('/', "%2F")
}

impl VersionBackend for GitlabCommits {
    fn latest_commit(&self, repo_name: &str, ref_name: &str) -> KrelResult<ResolvedCommit> {
        let url = format!(
            "{API_BASE}/projects/{}/repository/commits",
            project_path(repo_name)
        );
        debug!("Listing commits for {}@{}", repo_name, ref_name);

        let mut response = self.agent.get(&url).query("ref_name", ref_name).call()?;

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

        Ok(ResolvedCommit {
            repo_name: repo_name.to_string(),
            id: head.id,
            short_id: head.short_id,
            web_url: head.web_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_path_encodes_separator() {
        assert_eq!(project_path("simonpunk/susfs4ksu"), "simonpunk%2Fsusfs4ksu");
        assert_eq!(project_path("flat"), "flat");
    }

    #[test]
    fn commit_entry_parses_api_shape() {
        let body = r#"[{"id": "a1b2c3d4", "short_id": "a1b2c3d", "title": "patch", "web_url": "https://gitlab.com/simonpunk/susfs4ksu/-/commit/a1b2c3d4"}]"#;
        let commits: Vec<CommitEntry> = serde_json::from_str(body).unwrap();
        assert_eq!(commits[0].short_id, "a1b2c3d");
    }
}
