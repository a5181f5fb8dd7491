//! Application context: configuration, pack registry and capabilities.
//!
//! Replaces process-wide configuration state. Front-ends build one
//! [`AppContext`] and pass it to every operation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pack_fs::ConfigStore;
use pack_script::{Decompressor, Downloader, EventSink};

use crate::archive::ZipDecompressor;
use crate::config::{AppConfig, PackConfig, PackDescriptor};
use crate::error::{Error, Result};
use crate::transport::HttpDownloader;
use crate::update::{PackUpdate, UpdateOutcome, Updater};

const CONFIG_FILE: &str = "config.toml";

pub struct AppContext {
    config: AppConfig,
    config_path: PathBuf,
    data_dir: PathBuf,
    store: ConfigStore,
    packs: BTreeMap<String, PackConfig>,
    downloader: Arc<dyn Downloader>,
    decompressor: Arc<dyn Decompressor>,
}

impl AppContext {
    /// `<platform data dir>/packsync`.
    pub fn default_data_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join("packsync"))
            .ok_or(Error::NoDataDir)
    }

    /// Load from the default data directory, or from `config_path` when
    /// given, in which case its parent becomes the data directory.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let (data_dir, config_path) = match config_path {
            Some(path) => {
                let data_dir = path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default();
                (data_dir, path.to_path_buf())
            }
            None => {
                let data_dir = Self::default_data_dir()?;
                let config_path = data_dir.join(CONFIG_FILE);
                (data_dir, config_path)
            }
        };
        Self::open(data_dir, config_path)
    }

    /// Load (or create) the app config at `config_path` and every pack
    /// config it lists. Packs that fail to load are logged and skipped.
    pub fn open(data_dir: impl Into<PathBuf>, config_path: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        let config_path = config_path.into();
        let store = ConfigStore::new();
        let config = AppConfig::load_or_create(&store, &config_path)?;

        let mut packs = BTreeMap::new();
        for path in &config.pack_configs {
            match PackConfig::load(&store, path) {
                Ok(pack) => {
                    packs.insert(pack.id.clone(), pack);
                }
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "skipping unreadable pack config");
                }
            }
        }
        tracing::debug!(packs = packs.len(), config = %config_path.display(), "loaded context");

        let downloader = Arc::new(HttpDownloader::new(config.retry)?);
        Ok(Self {
            config,
            config_path,
            data_dir,
            store,
            packs,
            downloader,
            decompressor: Arc::new(ZipDecompressor),
        })
    }

    pub fn with_downloader(mut self, downloader: Arc<dyn Downloader>) -> Self {
        self.downloader = downloader;
        self
    }

    pub fn with_decompressor(mut self, decompressor: Arc<dyn Decompressor>) -> Self {
        self.decompressor = decompressor;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut AppConfig {
        &mut self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// The `$A` root: the directory holding the packsync data directory.
    pub fn appdata_dir(&self) -> PathBuf {
        self.data_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.data_dir.clone())
    }

    /// Where configs of packs installed from a URL are written.
    pub fn packs_dir(&self) -> PathBuf {
        self.data_dir.join("packs")
    }

    /// Per-session scratch space; each pack downloads below `session/<id>`.
    pub fn session_dir(&self) -> PathBuf {
        self.data_dir.join("session")
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn downloader(&self) -> Arc<dyn Downloader> {
        Arc::clone(&self.downloader)
    }

    pub fn decompressor(&self) -> Arc<dyn Decompressor> {
        Arc::clone(&self.decompressor)
    }

    /// Registered packs ordered by id.
    pub fn packs(&self) -> impl Iterator<Item = &PackConfig> {
        self.packs.values()
    }

    pub fn pack(&self, id: &str) -> Result<&PackConfig> {
        self.packs.get(id).ok_or_else(|| Error::PackNotFound { id: id.to_string() })
    }

    pub fn pack_mut(&mut self, id: &str) -> Result<&mut PackConfig> {
        self.packs
            .get_mut(id)
            .ok_or_else(|| Error::PackNotFound { id: id.to_string() })
    }

    /// Register the pack config at `path` and persist the app config.
    pub fn add_pack(&mut self, path: &Path) -> Result<&PackConfig> {
        let pack = PackConfig::load(&self.store, path)?;
        self.ensure_unregistered(&pack.id)?;
        self.register(pack)
    }

    /// Install a pack from the descriptor published at `url`.
    ///
    /// The pack config is written to `<data dir>/packs/<id>.toml` at version
    /// `0.0.0`, so the first update runs the full changelist route.
    pub async fn add_pack_from_url(&mut self, url: &str, instance_dir: Option<PathBuf>) -> Result<&PackConfig> {
        let text = self.downloader.fetch_text(url).await?;
        let descriptor = PackDescriptor::parse(&text, url)?;
        let path = self.packs_dir().join(format!("{}.toml", descriptor.id));
        let pack = descriptor.into_pack(instance_dir, path)?;
        self.ensure_unregistered(&pack.id)?;

        pack.save(&self.store)?;
        tracing::info!(id = %pack.id, url, "installed pack descriptor");
        self.register(pack)
    }

    fn ensure_unregistered(&self, id: &str) -> Result<()> {
        match self.packs.get(id) {
            Some(existing) => Err(Error::DuplicatePack {
                id: id.to_string(),
                path: existing.path.clone(),
            }),
            None => Ok(()),
        }
    }

    fn register(&mut self, pack: PackConfig) -> Result<&PackConfig> {
        tracing::info!(id = %pack.id, path = %pack.path.display(), "registering pack");
        self.config.pack_configs.push(pack.path.clone());
        let id = pack.id.clone();
        self.packs.insert(id.clone(), pack);
        self.save()?;
        self.pack(&id)
    }

    /// Unregister a pack. Its config file is left on disk.
    pub fn remove_pack(&mut self, id: &str) -> Result<PackConfig> {
        let pack = self
            .packs
            .remove(id)
            .ok_or_else(|| Error::PackNotFound { id: id.to_string() })?;
        self.config.pack_configs.retain(|path| path != &pack.path);
        if self.config.default_pack.as_deref() == Some(id) {
            self.config.default_pack = None;
        }
        tracing::info!(id, "unregistered pack");
        self.save()?;
        Ok(pack)
    }

    /// Persist the app config.
    pub fn save(&self) -> Result<()> {
        self.store.save(&self.config_path, &self.config)?;
        Ok(())
    }

    /// Workflow runner bound to this context's settings and capabilities.
    pub fn updater(&self) -> Updater {
        Updater::from_context(self)
    }

    /// Whether a newer packsync has been published at `app_version_url`.
    pub async fn is_app_update_needed(&self) -> Result<bool> {
        let url = self.config.app_version_url.as_deref().ok_or(Error::NoAppVersionUrl)?;
        self.updater()
            .is_app_update_needed(&self.config.app_version, url)
            .await
    }

    pub async fn upstream_version_file(&self, id: &str) -> Result<String> {
        self.updater().upstream_version_file(self.pack(id)?).await
    }

    pub async fn upstream_changelist(&self, id: &str) -> Result<String> {
        self.updater().upstream_changelist(self.pack(id)?).await
    }

    /// Query upstream and record the result on the registered pack.
    pub async fn check_pack(&mut self, id: &str) -> Result<bool> {
        let updater = self.updater();
        let pack = self.pack_mut(id)?;
        updater.is_update_needed(pack).await
    }

    /// Update one pack and keep the registry in step with its config file.
    pub async fn update_pack(&mut self, id: &str, sink: &dyn EventSink) -> Result<UpdateOutcome> {
        let updater = self.updater();
        let pack = self.pack_mut(id)?;
        updater.update_pack(pack, sink).await
    }

    /// Update every registered pack, `max_workers` at a time.
    pub async fn update_all(&mut self, sink: Arc<dyn EventSink>) -> Vec<(String, Result<UpdateOutcome>)> {
        let updater = self.updater();
        let packs: Vec<PackConfig> = self.packs.values().cloned().collect();
        let updates = updater.update_all(packs, sink).await;

        updates
            .into_iter()
            .map(|PackUpdate { pack, result }| {
                let id = pack.id.clone();
                self.packs.insert(id.clone(), pack);
                (id, result)
            })
            .collect()
    }
}
