//! Integration tests for krel
//!
//! Network-facing stages are exercised in unit tests through their
//! host/backend seams; here the binary runs with pinned versions so no
//! resolution leaves the process.

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;

    fn krel() -> Command {
        cargo_bin_cmd!("krel")
    }

    #[test]
    fn help_displays() {
        krel()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("kernel release pipeline"));
    }

    #[test]
    fn version_displays() {
        krel()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("krel"));
    }

    #[test]
    fn metadata_with_pinned_versions_runs_offline() {
        let temp = tempfile::TempDir::new().unwrap();
        let profiles = temp.path().join("devices");
        let out = temp.path().join("out");
        fs::create_dir_all(&profiles).unwrap();

        fs::write(
            profiles.join("tokay.json"),
            r#"{
                "grapheneos": {"branch": "stable"},
                "susfs": {"branch": "gki-android14-6.1"}
            }"#,
        )
        .unwrap();

        krel()
            .args([
                "metadata",
                "tokay",
                "owner/kernel",
                "main",
                out.to_str().unwrap(),
                "--profiles-dir",
                profiles.to_str().unwrap(),
            ])
            .env("GRAPHENEOS_VERSION", "2024020100")
            .env("KERNELSU_VERSION", "abc123")
            .env("SUSFS_VERSION", "def456")
            .assert()
            .success()
            .stdout(predicate::str::contains("GRAPHENEOS_BRANCH=stable"))
            .stdout(predicate::str::contains("DEVICE_ID=tokay"))
            .stdout(predicate::str::contains(
                "CACHE_KEY=tokay-2024020100-abc123-def456-main",
            ));

        let metadata_file = out.join("build_metadata_tokay_2024020100.json");
        assert!(metadata_file.exists());

        // The env command re-emits the persisted identity
        krel()
            .args(["env", metadata_file.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "CACHE_KEY=tokay-2024020100-abc123-def456-main",
            ))
            .stdout(predicate::str::contains("BUILD_NUMBER="));
    }

    #[test]
    fn metadata_unknown_device_fails() {
        let temp = tempfile::TempDir::new().unwrap();
        let profiles = temp.path().join("devices");
        fs::create_dir_all(&profiles).unwrap();

        krel()
            .args([
                "metadata",
                "missing",
                "owner/kernel",
                "main",
                temp.path().to_str().unwrap(),
                "--profiles-dir",
                profiles.to_str().unwrap(),
            ])
            .env("GRAPHENEOS_VERSION", "2024020100")
            .env("KERNELSU_VERSION", "abc123")
            .env("SUSFS_VERSION", "def456")
            .assert()
            .failure()
            .stderr(predicate::str::contains("device profile not found"));
    }

    #[test]
    fn gate_missing_metadata_fails() {
        krel()
            .args(["gate", "/nonexistent/build_metadata.json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("reading metadata file"));
    }

    #[test]
    fn publish_without_token_fails() {
        krel()
            .args(["publish", "/nonexistent/build_metadata.json", "kernel.zip"])
            .env_remove("GITHUB_TOKEN")
            .assert()
            .failure()
            .stderr(predicate::str::contains("no GitHub token"));
    }
}
