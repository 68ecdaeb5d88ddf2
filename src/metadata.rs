//! Build identity and persisted metadata
//!
//! The metadata file written here is the only channel of information
//! between pipeline stages; the gate and publish stages run in separate
//! processes and read everything they need back from it.

use crate::error::{KrelError, KrelResult};
use crate::resolve::{
    Backend, DependencyRef, Resolver, GRAPHENEOS_KERNEL_REPO, KERNELSU_REPO, SUSFS_REPO,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEVICE_ID_KEY: &str = "DEVICE_ID";
pub const GRAPHENEOS_VERSION_KEY: &str = "GRAPHENEOS_VERSION";
pub const KERNELSU_VERSION_KEY: &str = "KERNELSU_VERSION";
pub const SUSFS_VERSION_KEY: &str = "SUSFS_VERSION";
pub const CACHE_KEY_KEY: &str = "CACHE_KEY";
pub const BUILD_DATETIME_KEY: &str = "BUILD_DATETIME";
pub const BUILD_NUMBER_KEY: &str = "BUILD_NUMBER";
pub const BUILD_METADATA_FILE_KEY: &str = "BUILD_METADATA_FILE";

const GRAPHENEOS_BRANCH_KEY: &str = "GRAPHENEOS_BRANCH";
const KERNELSU_BRANCH_KEY: &str = "KERNELSU_BRANCH";
const SUSFS_BRANCH_KEY: &str = "SUSFS_BRANCH";

/// Source repository and ref the pipeline is building
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoRef {
    pub repo_name: String,
    pub ref_name: String,
}

/// The persisted pipeline artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildMetadata {
    pub env: Map<String, Value>,
    pub repo: RepoRef,
    pub dependencies: BTreeMap<Backend, Vec<DependencyRef>>,
}

impl BuildMetadata {
    /// Load a metadata file written by the metadata stage
    pub fn load(path: &Path) -> KrelResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| KrelError::io(format!("reading metadata file {}", path.display()), e))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the metadata file, creating its directory if needed
    pub fn save(&self, path: &Path) -> KrelResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| KrelError::io("creating metadata output directory", e))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .map_err(|e| KrelError::io(format!("writing metadata file {}", path.display()), e))?;

        Ok(())
    }

    /// Look up a string-valued identity key
    pub fn string_value(&self, key: &str) -> Option<&str> {
        self.env.get(key).and_then(Value::as_str)
    }

    /// Look up a required string-valued identity key
    pub fn require(&self, key: &str, path: &Path) -> KrelResult<&str> {
        self.string_value(key)
            .ok_or_else(|| KrelError::MissingIdentityKey {
                key: key.to_string(),
                path: path.to_path_buf(),
            })
    }

    /// Iterate all dependencies with their backend, in persisted order
    pub fn all_dependencies(&self) -> impl Iterator<Item = (Backend, &DependencyRef)> {
        self.dependencies
            .iter()
            .flat_map(|(backend, deps)| deps.iter().map(|dep| (*backend, dep)))
    }
}

/// Flatten a nested device profile into environment-style keys
///
/// Every nesting level contributes an upper-cased prefix segment; every
/// non-object value becomes one flat entry under the underscore-joined
/// path. Source order is preserved.
pub fn flatten(profile: &Map<String, Value>) -> Map<String, Value> {
    let mut flat = Map::new();
    flatten_into(profile, "", &mut flat);
    flat
}

fn flatten_into(node: &Map<String, Value>, prefix: &str, flat: &mut Map<String, Value>) {
    for (key, value) in node {
        let key = key.to_uppercase();
        match value {
            Value::Object(child) => flatten_into(child, &format!("{prefix}{key}_"), flat),
            scalar => {
                flat.insert(format!("{prefix}{key}"), scalar.clone());
            }
        }
    }
}

/// Render one identity value the way it appears in KEY=value output
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render the flat identity as line-oriented KEY=value pairs
pub fn env_lines(env: &Map<String, Value>) -> String {
    env.iter()
        .map(|(key, value)| format!("{key}={}", scalar_text(value)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cache key uniquely identifying one build attempt
pub fn cache_key(device: &str, gos: &str, ksu: &str, susfs: &str, ref_name: &str) -> String {
    format!("{device}-{gos}-{ksu}-{susfs}-{ref_name}")
}

/// Metadata file name, one per (device, OS version) pair
pub fn metadata_file_name(device: &str, gos_version: &str) -> String {
    format!("build_metadata_{device}_{gos_version}.json")
}

/// Builds and persists the metadata artifact for one pipeline run
pub struct MetadataBuilder<'a> {
    resolver: &'a Resolver,
}

impl<'a> MetadataBuilder<'a> {
    pub fn new(resolver: &'a Resolver) -> Self {
        Self { resolver }
    }

    /// Resolve versions, derive the build identity, and write the artifact
    pub fn build(
        &self,
        device: &str,
        repo_name: &str,
        ref_name: &str,
        profiles_dir: &Path,
        output_dir: &Path,
    ) -> KrelResult<BuildMetadata> {
        let profile = load_profile(profiles_dir, device)?;
        let mut env = flatten(&profile);

        let gos_branch = branch_or(&env, GRAPHENEOS_BRANCH_KEY, "stable");
        let gos_version = self.resolver.grapheneos_version(device, &gos_branch)?;

        let ksu_branch = branch_or(&env, KERNELSU_BRANCH_KEY, "main");
        let ksu_version = self.resolver.kernelsu_version(&ksu_branch)?;

        let susfs_branch = env
            .get(SUSFS_BRANCH_KEY)
            .map(scalar_text)
            .ok_or_else(|| KrelError::MissingProfileKey {
                device: device.to_string(),
                key: SUSFS_BRANCH_KEY.to_string(),
            })?;
        let susfs_version = self.resolver.susfs_version(&susfs_branch)?;

        let metadata_path = output_dir.join(metadata_file_name(device, &gos_version));
        let now = Local::now();

        env.insert(DEVICE_ID_KEY.into(), Value::from(device));
        env.insert(
            GRAPHENEOS_VERSION_KEY.into(),
            Value::from(gos_version.as_str()),
        );
        env.insert(KERNELSU_VERSION_KEY.into(), Value::from(ksu_version.as_str()));
        env.insert(SUSFS_VERSION_KEY.into(), Value::from(susfs_version.as_str()));
        env.insert(
            CACHE_KEY_KEY.into(),
            Value::from(cache_key(
                device,
                &gos_version,
                &ksu_version,
                &susfs_version,
                ref_name,
            )),
        );
        env.insert(BUILD_DATETIME_KEY.into(), Value::from(now.timestamp()));
        env.insert(
            BUILD_NUMBER_KEY.into(),
            Value::from(now.format("%Y%m%d.%H%M%S").to_string()),
        );
        env.insert(
            BUILD_METADATA_FILE_KEY.into(),
            Value::from(metadata_path.display().to_string()),
        );

        let metadata = BuildMetadata {
            env,
            repo: RepoRef {
                repo_name: repo_name.to_string(),
                ref_name: ref_name.to_string(),
            },
            dependencies: dependency_set(&gos_version, &susfs_version, &ksu_version),
        };

        metadata.save(&metadata_path)?;
        info!("Build metadata written to {}", metadata_path.display());

        Ok(metadata)
    }
}

/// The three tracked upstreams, pinned to the versions just resolved
fn dependency_set(
    gos_version: &str,
    susfs_version: &str,
    ksu_version: &str,
) -> BTreeMap<Backend, Vec<DependencyRef>> {
    let mut dependencies = BTreeMap::new();
    dependencies.insert(
        Backend::Gitlab,
        vec![
            DependencyRef::new("GrapheneOS", GRAPHENEOS_KERNEL_REPO, gos_version),
            DependencyRef::new("susfs4ksu", SUSFS_REPO, susfs_version),
        ],
    );
    dependencies.insert(
        Backend::Github,
        vec![DependencyRef::new("KernelSU", KERNELSU_REPO, ksu_version)],
    );
    dependencies
}

fn branch_or(env: &Map<String, Value>, key: &str, default: &str) -> String {
    env.get(key)
        .map(scalar_text)
        .unwrap_or_else(|| default.to_string())
}

fn load_profile(profiles_dir: &Path, device: &str) -> KrelResult<Map<String, Value>> {
    let path = profiles_dir.join(format!("{device}.json"));
    if !path.exists() {
        return Err(KrelError::ProfileNotFound(path));
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| KrelError::io(format!("reading device profile {}", path.display()), e))?;

    match serde_json::from_str(&content)? {
        Value::Object(profile) => Ok(profile),
        other => Err(KrelError::ProfileInvalid {
            path,
            reason: format!("expected a JSON object, got {}", value_kind(&other)),
        }),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
