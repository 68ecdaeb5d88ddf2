//! Dependency version resolution
//!
//! Provides trait seams for the two commit-hosting backends (GitLab,
//! GitHub) and the GrapheneOS release channel, plus the environment
//! pinning layer that makes re-runs reproducible without network calls.

pub mod channel;
pub mod github;
pub mod gitlab;

use crate::error::{KrelError, KrelResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Source repository the kernel tree itself tracks
pub const GRAPHENEOS_KERNEL_REPO: &str = "GrapheneOS/kernel_pixel";

/// KernelSU patch set repository (GitHub)
pub const KERNELSU_REPO: &str = "tiann/KernelSU";

/// susfs4ksu patch repository (GitLab)
pub const SUSFS_REPO: &str = "simonpunk/susfs4ksu";

/// Placeholder device used for dry runs; has no release channel of its
/// own and resolves against a real device instead.
pub const DRY_RUN_DEVICE: &str = "dummy";

const DRY_RUN_CHANNEL_DEVICE: &str = "tokay";

/// Hosting service a dependency's version history lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Gitlab,
    Github,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gitlab => "gitlab",
            Self::Github => "github",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = KrelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gitlab" => Ok(Self::Gitlab),
            "github" => Ok(Self::Github),
            other => Err(KrelError::UnsupportedBackend(other.to_string())),
        }
    }
}

// Manual Deserialize so an unknown backend tag in a metadata file
// surfaces as the UnsupportedBackend diagnostic, not a serde variant
// listing.
impl<'de> Deserialize<'de> for Backend {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

/// A dependency pinned to a repository and ref
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRef {
    pub name: String,
    pub repo_name: String,
    pub ref_name: String,
}

impl DependencyRef {
    pub fn new(
        name: impl Into<String>,
        repo_name: impl Into<String>,
        ref_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            repo_name: repo_name.into(),
            ref_name: ref_name.into(),
        }
    }
}

/// Immutable result of resolving the tip of a ref
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommit {
    pub repo_name: String,
    pub id: String,
    pub short_id: String,
    pub web_url: String,
}

/// Abstract commit-listing backend
pub trait VersionBackend {
    /// Return the most recent commit reachable from `ref_name`
    fn latest_commit(&self, repo_name: &str, ref_name: &str) -> KrelResult<ResolvedCommit>;
}

/// Release-channel lookup for OS versions
pub trait ReleaseChannel {
    /// Return the latest OS version published on `{device}-{branch}`
    fn latest_release(&self, device: &str, branch: &str) -> KrelResult<String>;
}

/// Operator-supplied version pins, read once at process entry
///
/// A set pin is returned verbatim and skips network resolution for
/// that dependency entirely.
#[derive(Debug, Clone, Default)]
pub struct VersionPins {
    pub grapheneos: Option<String>,
    pub kernelsu: Option<String>,
    pub susfs: Option<String>,
}

impl VersionPins {
    /// Read pins from the conventional environment variables
    pub fn from_env() -> Self {
        fn pin(name: &str) -> Option<String> {
            std::env::var(name).ok().filter(|v| !v.is_empty())
        }

        Self {
            grapheneos: pin("GRAPHENEOS_VERSION"),
            kernelsu: pin("KERNELSU_VERSION"),
            susfs: pin("SUSFS_VERSION"),
        }
    }
}

/// Version resolver dispatching over backend implementations
pub struct Resolver {
    pins: VersionPins,
    gitlab: Box<dyn VersionBackend>,
    github: Box<dyn VersionBackend>,
    channel: Box<dyn ReleaseChannel>,
}

impl Resolver {
    /// Create a resolver backed by the real hosting services
    pub fn new(pins: VersionPins) -> Self {
        Self {
            pins,
            gitlab: Box::new(gitlab::GitlabCommits::new()),
            github: Box::new(github::GithubCommits::new()),
            channel: Box::new(channel::GrapheneosReleases::new()),
        }
    }

    /// Create a resolver with injected backends
    pub fn with_backends(
        pins: VersionPins,
        gitlab: Box<dyn VersionBackend>,
        github: Box<dyn VersionBackend>,
        channel: Box<dyn ReleaseChannel>,
    ) -> Self {
        Self {
            pins,
            gitlab,
            github,
            channel,
        }
    }

    fn backend(&self, backend: Backend) -> &dyn VersionBackend {
        match backend {
            Backend::Gitlab => self.gitlab.as_ref(),
            Backend::Github => self.github.as_ref(),
        }
    }

    /// Resolve the latest commit for a dependency on the given backend
    pub fn latest_commit(
        &self,
        backend: Backend,
        dependency: &DependencyRef,
    ) -> KrelResult<ResolvedCommit> {
        self.backend(backend)
            .latest_commit(&dependency.repo_name, &dependency.ref_name)
    }

    /// Resolve the latest GrapheneOS release for a device branch
    pub fn grapheneos_version(&self, device: &str, branch: &str) -> KrelResult<String> {
        if let Some(pin) = &self.pins.grapheneos {
            debug!("GrapheneOS version pinned to {}", pin);
            return Ok(pin.clone());
        }

        let channel_device = if device == DRY_RUN_DEVICE {
            DRY_RUN_CHANNEL_DEVICE
        } else {
            device
        };

        self.channel.latest_release(channel_device, branch)
    }

    /// Resolve the latest KernelSU revision on a branch
    pub fn kernelsu_version(&self, branch: &str) -> KrelResult<String> {
        if let Some(pin) = &self.pins.kernelsu {
            debug!("KernelSU version pinned to {}", pin);
            return Ok(pin.clone());
        }

        Ok(self.github.latest_commit(KERNELSU_REPO, branch)?.id)
    }

    /// Resolve the latest susfs4ksu revision on a branch
    pub fn susfs_version(&self, branch: &str) -> KrelResult<String> {
        if let Some(pin) = &self.pins.susfs {
            debug!("susfs version pinned to {}", pin);
            return Ok(pin.clone());
        }

        Ok(self.gitlab.latest_commit(SUSFS_REPO, branch)?.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    /// Backend that fails the test if any network resolution is attempted
    struct UnreachableBackend;

    impl VersionBackend for UnreachableBackend {
        fn latest_commit(&self, repo_name: &str, _ref_name: &str) -> KrelResult<ResolvedCommit> {
            panic!("unexpected network resolution for {}", repo_name);
        }
    }

    struct UnreachableChannel;

    impl ReleaseChannel for UnreachableChannel {
        fn latest_release(&self, device: &str, _branch: &str) -> KrelResult<String> {
            panic!("unexpected channel lookup for {}", device);
        }
    }

    struct FixedChannel(&'static str);

    impl ReleaseChannel for FixedChannel {
        fn latest_release(&self, device: &str, branch: &str) -> KrelResult<String> {
            Ok(format!("{}:{}:{}", self.0, device, branch))
        }
    }

    struct FixedBackend(&'static str);

    impl VersionBackend for FixedBackend {
        fn latest_commit(&self, repo_name: &str, ref_name: &str) -> KrelResult<ResolvedCommit> {
            Ok(ResolvedCommit {
                repo_name: repo_name.to_string(),
                id: format!("{}-{}-{}", self.0, repo_name, ref_name),
                short_id: self.0.to_string(),
                web_url: format!("https://example.com/{}", repo_name),
            })
        }
    }

    fn pinned_resolver(pins: VersionPins) -> Resolver {
        Resolver::with_backends(
            pins,
            Box::new(UnreachableBackend),
            Box::new(UnreachableBackend),
            Box::new(UnreachableChannel),
        )
    }

    #[test]
    fn pins_bypass_all_network_resolution() {
        let resolver = pinned_resolver(VersionPins {
            grapheneos: Some("2024020100".to_string()),
            kernelsu: Some("abc123".to_string()),
            susfs: Some("def456".to_string()),
        });

        assert_eq!(
            resolver.grapheneos_version("tokay", "stable").unwrap(),
            "2024020100"
        );
        assert_eq!(resolver.kernelsu_version("main").unwrap(), "abc123");
        assert_eq!(resolver.susfs_version("gki").unwrap(), "def456");
    }

    #[test]
    fn dry_run_device_resolves_against_real_channel() {
        let resolver = Resolver::with_backends(
            VersionPins::default(),
            Box::new(UnreachableBackend),
            Box::new(UnreachableBackend),
            Box::new(FixedChannel("release")),
        );

        assert_eq!(
            resolver.grapheneos_version(DRY_RUN_DEVICE, "stable").unwrap(),
            "release:tokay:stable"
        );
        assert_eq!(
            resolver.grapheneos_version("comet", "beta").unwrap(),
            "release:comet:beta"
        );
    }

    #[test]
    fn latest_commit_dispatches_on_backend() {
        let resolver = Resolver::with_backends(
            VersionPins::default(),
            Box::new(FixedBackend("gl")),
            Box::new(FixedBackend("gh")),
            Box::new(UnreachableChannel),
        );

        let dep = DependencyRef::new("KernelSU", KERNELSU_REPO, "main");
        let commit = resolver.latest_commit(Backend::Github, &dep).unwrap();
        assert_eq!(commit.short_id, "gh");

        let dep = DependencyRef::new("susfs4ksu", SUSFS_REPO, "gki");
        let commit = resolver.latest_commit(Backend::Gitlab, &dep).unwrap();
        assert_eq!(commit.short_id, "gl");
    }

    #[test]
    fn backend_round_trips_through_strings() {
        assert_eq!("gitlab".parse::<Backend>().unwrap(), Backend::Gitlab);
        assert_eq!("github".parse::<Backend>().unwrap(), Backend::Github);
        assert!(matches!(
            "bitbucket".parse::<Backend>(),
            Err(KrelError::UnsupportedBackend(_))
        ));

        let json = serde_json::to_string(&Backend::Gitlab).unwrap();
        assert_eq!(json, "\"gitlab\"");
        let parsed: Backend = serde_json::from_str("\"github\"").unwrap();
        assert_eq!(parsed, Backend::Github);
    }

    #[test]
    #[serial]
    fn pins_read_from_environment() {
        std::env::set_var("GRAPHENEOS_VERSION", "2024020100");
        std::env::set_var("KERNELSU_VERSION", "");
        std::env::remove_var("SUSFS_VERSION");

        let pins = VersionPins::from_env();
        assert_eq!(pins.grapheneos.as_deref(), Some("2024020100"));
        assert_eq!(pins.kernelsu, None);
        assert_eq!(pins.susfs, None);

        std::env::remove_var("GRAPHENEOS_VERSION");
        std::env::remove_var("KERNELSU_VERSION");
    }
}
