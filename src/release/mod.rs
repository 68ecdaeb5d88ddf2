//! Release host abstraction and GitHub implementation
//!
//! The host trait is the seam both the gate and the publisher go
//! through. Conflict responses (422) are modeled as outcomes, not
//! errors: the host's uniqueness constraints are the only mutual
//! exclusion between concurrent runs for the same device and version.

pub mod changelog;
pub mod gate;
pub mod publish;

use crate::error::{KrelError, KrelResult};
use crate::http;
use serde::{Deserialize, Serialize};
use tracing::debug;
use ureq::Agent;

const API_BASE: &str = "https://api.github.com";
const UPLOADS_BASE: &str = "https://uploads.github.com";
const CONFLICT: u16 = 422;

/// A published release and its attached assets
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub id: u64,
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// An asset attached to a release
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
}

/// Request payload for creating a tagged release
#[derive(Debug, Clone, Serialize)]
pub struct NewRelease<'a> {
    pub tag_name: &'a str,
    pub name: &'a str,
    pub target_commitish: &'a str,
    pub body: &'a str,
}

/// Outcome of a release creation attempt
#[derive(Debug)]
pub enum CreateOutcome {
    Created(Release),
    AlreadyExists,
}

/// Outcome of an asset upload attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded,
    AlreadyExists,
}

/// Abstract release host
pub trait ReleaseHost {
    /// Fetch a release by tag; absence is not an error
    fn release_by_tag(&self, repo: &str, tag: &str) -> KrelResult<Option<Release>>;

    /// Create a tagged release pointing at the default branch tip
    fn create_release(&self, repo: &str, new: &NewRelease<'_>) -> KrelResult<CreateOutcome>;

    /// Upload bytes as a named release asset
    fn upload_asset(
        &self,
        repo: &str,
        release_id: u64,
        name: &str,
        bytes: &[u8],
    ) -> KrelResult<UploadOutcome>;
}

/// Asset naming convention for finished kernel builds
pub fn kernel_asset_name(device: &str, version: &str) -> String {
    format!("kernel-{device}-{version}.zip")
}

/// GitHub releases API client
pub struct GithubReleases {
    agent: Agent,
    token: Option<String>,
}

impl GithubReleases {
    /// Token is required for writes; reads work anonymously
    pub fn new(token: Option<String>) -> Self {
        Self {
            agent: http::agent(),
            token,
        }
    }

    fn get(&self, url: &str) -> ureq::RequestBuilder<ureq::typestate::WithoutBody> {
        let mut request = self
            .agent
            .get(url)
            .header("accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.header("authorization", &format!("Bearer {token}"));
        }
        request
    }

    fn post(&self, url: &str) -> ureq::RequestBuilder<ureq::typestate::WithBody> {
        let mut request = self
            .agent
            .post(url)
            .header("accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.header("authorization", &format!("Bearer {token}"));
        }
        request
    }
}

impl ReleaseHost for GithubReleases {
    fn release_by_tag(&self, repo: &str, tag: &str) -> KrelResult<Option<Release>> {
        let url = format!("{API_BASE}/repos/{repo}/releases/tags/{tag}");
        debug!("Looking up release {}@{}", repo, tag);

        let mut response = self.get(&url).call()?;
        let status = response.status().as_u16();

        match status {
            200..=299 => {
                let body = response
                    .body_mut()
                    .read_to_string()
                    .map_err(KrelError::Transport)?;
                let release =
                    serde_json::from_str(&body).map_err(|e| KrelError::ReleaseLookup {
                        repo: repo.to_string(),
                        tag: tag.to_string(),
                        status,
                        body: format!("malformed response: {e}"),
                    })?;
                Ok(Some(release))
            }
            404 => Ok(None),
            _ => Err(KrelError::ReleaseLookup {
                repo: repo.to_string(),
                tag: tag.to_string(),
                status,
                body: http::body_text(&mut response),
            }),
        }
    }

    fn create_release(&self, repo: &str, new: &NewRelease<'_>) -> KrelResult<CreateOutcome> {
        let url = format!("{API_BASE}/repos/{repo}/releases");
        debug!("Creating release {}@{}", repo, new.tag_name);

        let mut response = self.post(&url).send_json(new)?;
        let status = response.status().as_u16();

        match status {
            200..=299 => {
                let body = response
                    .body_mut()
                    .read_to_string()
                    .map_err(KrelError::Transport)?;
                let release = serde_json::from_str(&body).map_err(|e| {
                    KrelError::rejected(
                        "create release",
                        repo,
                        status,
                        format!("malformed response: {e}"),
                    )
                })?;
                Ok(CreateOutcome::Created(release))
            }
            CONFLICT => Ok(CreateOutcome::AlreadyExists),
            _ => Err(KrelError::rejected(
                "create release",
                repo,
                status,
                http::body_text(&mut response),
            )),
        }
    }

    fn upload_asset(
        &self,
        repo: &str,
        release_id: u64,
        name: &str,
        bytes: &[u8],
    ) -> KrelResult<UploadOutcome> {
        let url = format!("{UPLOADS_BASE}/repos/{repo}/releases/{release_id}/assets");
        debug!("Uploading asset {} to release {}", name, release_id);

        let mut response = self
            .post(&url)
            .query("name", name)
            .header("content-type", "application/octet-stream")
            .send(bytes)?;
        let status = response.status().as_u16();

        match status {
            200..=299 => Ok(UploadOutcome::Uploaded),
            CONFLICT => Ok(UploadOutcome::AlreadyExists),
            _ => Err(KrelError::rejected(
                "upload asset",
                repo,
                status,
                http::body_text(&mut response),
            )),
        }
    }
}
