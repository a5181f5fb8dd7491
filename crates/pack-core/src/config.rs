//! Application and pack configuration files.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use pack_fs::ConfigStore;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::version::{Version, VersionOrdering};

/// Retry policy for every network request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Constant delay between attempts, in milliseconds.
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            delay_ms: 1000,
        }
    }
}

impl RetryPolicy {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// `config.toml` in the packsync data directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Version of packsync that last wrote the file.
    pub app_version: String,
    /// File holding the latest published packsync version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_version_url: Option<String>,
    /// Pack id shown first by front-ends.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_pack: Option<String>,
    /// Pack configuration files to load at startup.
    pub pack_configs: Vec<PathBuf>,
    /// Packs updated concurrently by `update-all`.
    pub max_workers: usize,
    /// Compare versions the way older changelists expect.
    pub legacy_version_ordering: bool,
    /// Nesting limit for `import` directives.
    pub max_import_depth: usize,
    pub retry: RetryPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            app_version_url: None,
            default_pack: None,
            pack_configs: Vec::new(),
            max_workers: 5,
            legacy_version_ordering: false,
            max_import_depth: pack_script::DEFAULT_MAX_IMPORT_DEPTH,
            retry: RetryPolicy::default(),
        }
    }
}

impl AppConfig {
    /// Load `path`, writing a default file first if it does not exist.
    pub fn load_or_create(store: &ConfigStore, path: &Path) -> Result<Self> {
        if path.exists() {
            return Ok(store.load(path)?);
        }
        tracing::info!(path = %path.display(), "creating default configuration");
        let config = Self::default();
        store.save(path, &config)?;
        Ok(config)
    }

    pub fn ordering(&self) -> VersionOrdering {
        VersionOrdering::from_legacy_flag(self.legacy_version_ordering)
    }
}

fn default_branch() -> String {
    "Main".to_string()
}

fn default_local_version() -> String {
    "0.0.0".to_string()
}

/// One tracked pack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Branch looked up in the upstream versioning file.
    #[serde(default = "default_branch")]
    pub local_branch: String,
    #[serde(default = "default_local_version")]
    pub local_version: String,
    /// Versioning file: branch names each followed by that branch's version.
    pub upstream_version_url: String,
    /// Changelist consumed by the update script compiler.
    pub upstream_changelist: String,
    /// Directory the pack is installed into, the `$I` root.
    pub instance_dir: PathBuf,
    /// Game or launcher install directory, the `$G` root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_dir: Option<PathBuf>,

    /// Latest version seen upstream during this session.
    #[serde(skip)]
    pub upstream_version: Option<String>,
    /// File this config was loaded from.
    #[serde(skip)]
    pub path: PathBuf,
}

impl PackConfig {
    pub fn load(store: &ConfigStore, path: &Path) -> Result<Self> {
        let mut pack: Self = store.load(path)?;
        pack.validate_id()?;
        pack.path = path.to_path_buf();
        Ok(pack)
    }

    /// The id becomes a directory name under the session directory, so it
    /// must be exactly one normal path component.
    pub fn validate_id(&self) -> Result<()> {
        let mut components = Path::new(&self.id).components();
        let single = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if single && !self.id.contains(['/', '\\', ':']) && self.id.trim() == self.id {
            Ok(())
        } else {
            Err(Error::InvalidPackId {
                id: self.id.clone(),
            })
        }
    }

    /// Write back to the file this config was loaded from.
    pub fn save(&self, store: &ConfigStore) -> Result<()> {
        store.save(&self.path, self)?;
        Ok(())
    }

    pub fn local_version(&self) -> Result<Version> {
        self.local_version.parse()
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() { &self.id } else { &self.name }
    }
}

/// A pack as published upstream: its config minus anything machine-local.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PackDescriptor {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_branch")]
    pub local_branch: String,
    pub upstream_version_url: String,
    pub upstream_changelist: String,
    /// Suggested instance directory, used when the installer names none.
    #[serde(default)]
    pub instance_dir: Option<PathBuf>,
}

impl PackDescriptor {
    /// Parse a TOML descriptor fetched from `source_url`.
    pub fn parse(text: &str, source_url: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Descriptor {
            source_url: source_url.to_string(),
            message: e.to_string(),
        })
    }

    /// A fresh pack at version `0.0.0`, to be saved at `path`.
    pub fn into_pack(self, instance_dir: Option<PathBuf>, path: PathBuf) -> Result<PackConfig> {
        let instance_dir = instance_dir
            .or(self.instance_dir)
            .ok_or_else(|| Error::MissingInstanceDir { id: self.id.clone() })?;
        let pack = PackConfig {
            id: self.id,
            name: self.name,
            description: self.description,
            local_branch: self.local_branch,
            local_version: default_local_version(),
            upstream_version_url: self.upstream_version_url,
            upstream_changelist: self.upstream_changelist,
            instance_dir,
            install_dir: None,
            upstream_version: None,
            path,
        };
        pack.validate_id()?;
        Ok(pack)
    }
}
