//! Error types for krel
//!
//! All modules use `KrelResult<T>` as their return type. Publish
//! conflicts (release or asset already exists) are deliberately NOT
//! errors; they are modeled as outcomes in `release::host`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for krel operations
pub type KrelResult<T> = Result<T, KrelError>;

/// All errors that can occur in krel
#[derive(Error, Debug)]
pub enum KrelError {
    // Resolution errors
    #[error("failed to resolve latest commit for {repo}@{ref_name}: {status} {body}")]
    ResolutionFailed {
        repo: String,
        ref_name: String,
        status: u16,
        body: String,
    },

    #[error("no commits reachable from {repo}@{ref_name}")]
    EmptyHistory { repo: String, ref_name: String },

    #[error("release channel {channel} returned an empty version")]
    ChannelEmpty { channel: String },

    #[error("unsupported backend: {0}")]
    UnsupportedBackend(String),

    // Device profile errors
    #[error("device profile not found: {0}")]
    ProfileNotFound(PathBuf),

    #[error("invalid device profile at {path}: {reason}")]
    ProfileInvalid { path: PathBuf, reason: String },

    #[error("device profile for {device} is missing required key {key}")]
    MissingProfileKey { device: String, key: String },

    // Metadata errors
    #[error("build metadata at {path} is missing identity key {key}")]
    MissingIdentityKey { key: String, path: PathBuf },

    // Release host errors
    #[error("release lookup for {repo}@{tag} failed: {status} {body}")]
    ReleaseLookup {
        repo: String,
        tag: String,
        status: u16,
        body: String,
    },

    #[error("{operation} rejected by release host for {repo}: {status} {body}")]
    HostRejected {
        operation: String,
        repo: String,
        status: u16,
        body: String,
    },

    #[error("release for tag {tag} reported as existing but not found on re-fetch")]
    ReleaseVanished { tag: String },

    #[error("no GitHub token provided. Pass --token or set GITHUB_TOKEN")]
    MissingToken,

    // Transport errors
    #[error("transport error: {0}")]
    Transport(#[from] ureq::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl KrelError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a host rejection error
    pub fn rejected(
        operation: impl Into<String>,
        repo: impl Into<String>,
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        Self::HostRejected {
            operation: operation.into(),
            repo: repo.into(),
            status,
            body: body.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = KrelError::ResolutionFailed {
            repo: "tiann/KernelSU".to_string(),
            ref_name: "main".to_string(),
            status: 502,
            body: "bad gateway".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("tiann/KernelSU@main"));
        assert!(text.contains("502"));
    }

    #[test]
    fn unsupported_backend_display() {
        let err = KrelError::UnsupportedBackend("bitbucket".to_string());
        assert_eq!(err.to_string(), "unsupported backend: bitbucket");
    }
}
