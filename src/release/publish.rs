//! Idempotent release creation and asset upload
//!
//! Re-invoking the publish stage for an already-published version is
//! safe: conflicts collapse into lookups or no-ops, and the same
//! release id comes back every time.

use crate::error::{KrelError, KrelResult};
use crate::release::{CreateOutcome, NewRelease, ReleaseHost, UploadOutcome};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_BRANCH: &str = "main";

/// Create a tagged release, or return the existing one's id on conflict
pub fn create_or_get_release(
    host: &dyn ReleaseHost,
    repo: &str,
    tag: &str,
    body: &str,
) -> KrelResult<u64> {
    let new = NewRelease {
        tag_name: tag,
        name: tag,
        target_commitish: DEFAULT_BRANCH,
        body,
    };

    match host.create_release(repo, &new)? {
        CreateOutcome::Created(release) => {
            info!("Created release {} ({})", tag, release.id);
            Ok(release.id)
        }
        CreateOutcome::AlreadyExists => {
            debug!("Release {} already exists, fetching its id", tag);
            host.release_by_tag(repo, tag)?
                .map(|release| release.id)
                .ok_or_else(|| KrelError::ReleaseVanished {
                    tag: tag.to_string(),
                })
        }
    }
}

/// Upload a file as a release asset; an existing asset is a no-op
pub fn attach_asset(
    host: &dyn ReleaseHost,
    repo: &str,
    release_id: u64,
    path: &Path,
) -> KrelResult<()> {
    let name = path
        .file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned();

    let bytes = fs::read(path)
        .map_err(|e| KrelError::io(format!("reading asset {}", path.display()), e))?;

    match host.upload_asset(repo, release_id, &name, &bytes)? {
        UploadOutcome::Uploaded => info!("Uploaded asset {}", name),
        UploadOutcome::AlreadyExists => info!("Asset {} already attached, skipping", name),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::{Release, ReleaseAsset};
    use std::cell::RefCell;

    /// In-memory host enforcing the same uniqueness constraints GitHub does
    struct FakeHost {
        releases: RefCell<Vec<Release>>,
        next_id: RefCell<u64>,
    }

    impl FakeHost {
        fn new() -> Self {
            Self {
                releases: RefCell::new(vec![]),
                next_id: RefCell::new(100),
            }
        }
    }

    impl ReleaseHost for FakeHost {
        fn release_by_tag(&self, _repo: &str, tag: &str) -> KrelResult<Option<Release>> {
            Ok(self
                .releases
                .borrow()
                .iter()
                .find(|r| r.tag_name == tag)
                .cloned())
        }

        fn create_release(&self, _repo: &str, new: &NewRelease<'_>) -> KrelResult<CreateOutcome> {
            let mut releases = self.releases.borrow_mut();
            if releases.iter().any(|r| r.tag_name == new.tag_name) {
                return Ok(CreateOutcome::AlreadyExists);
            }

            let mut next_id = self.next_id.borrow_mut();
            let release = Release {
                id: *next_id,
                tag_name: new.tag_name.to_string(),
                assets: vec![],
            };
            *next_id += 1;
            releases.push(release.clone());
            Ok(CreateOutcome::Created(release))
        }

        fn upload_asset(
            &self,
            _repo: &str,
            release_id: u64,
            name: &str,
            _bytes: &[u8],
        ) -> KrelResult<UploadOutcome> {
            let mut releases = self.releases.borrow_mut();
            let release = releases
                .iter_mut()
                .find(|r| r.id == release_id)
                .expect("upload to unknown release");

            if release.assets.iter().any(|a| a.name == name) {
                return Ok(UploadOutcome::AlreadyExists);
            }
            release.assets.push(ReleaseAsset {
                name: name.to_string(),
            });
            Ok(UploadOutcome::Uploaded)
        }
    }

    #[test]
    fn create_twice_returns_same_id() {
        let host = FakeHost::new();
        let first = create_or_get_release(&host, "o/k", "1.0", "notes").unwrap();
        let second = create_or_get_release(&host, "o/k", "1.0", "notes").unwrap();
        assert_eq!(first, second);
        assert_eq!(host.releases.borrow().len(), 1);
    }

    #[test]
    fn attach_twice_leaves_single_asset() {
        let temp = tempfile::TempDir::new().unwrap();
        let artifact = temp.path().join("kernel-tokay-2024020100.zip");
        fs::write(&artifact, b"zip bytes").unwrap();

        let host = FakeHost::new();
        let id = create_or_get_release(&host, "o/k", "2024020100", "notes").unwrap();

        attach_asset(&host, "o/k", id, &artifact).unwrap();
        attach_asset(&host, "o/k", id, &artifact).unwrap();

        let releases = host.releases.borrow();
        assert_eq!(releases[0].assets.len(), 1);
        assert_eq!(releases[0].assets[0].name, "kernel-tokay-2024020100.zip");
    }

    #[test]
    fn missing_artifact_is_an_io_error() {
        let host = FakeHost::new();
        let id = create_or_get_release(&host, "o/k", "2024020100", "notes").unwrap();

        let err = attach_asset(&host, "o/k", id, Path::new("/nonexistent/kernel.zip")).unwrap_err();
        assert!(matches!(err, KrelError::Io { .. }));
    }

    #[test]
    fn conflict_with_vanished_release_is_fatal() {
        struct LyingHost;

        impl ReleaseHost for LyingHost {
            fn release_by_tag(&self, _: &str, _: &str) -> KrelResult<Option<Release>> {
                Ok(None)
            }

            fn create_release(&self, _: &str, _: &NewRelease<'_>) -> KrelResult<CreateOutcome> {
                Ok(CreateOutcome::AlreadyExists)
            }

            fn upload_asset(&self, _: &str, _: u64, _: &str, _: &[u8]) -> KrelResult<UploadOutcome> {
                unimplemented!()
            }
        }

        let err = create_or_get_release(&LyingHost, "o/k", "1.0", "notes").unwrap_err();
        assert!(matches!(err, KrelError::ReleaseVanished { .. }));
    }
}
