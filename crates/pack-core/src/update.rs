//! Update workflow: check upstream, compile the changelist, run it.
//!
//! ```text
//! is_update_needed ── upstream versioning file ──► Version compare
//! update_pack:
//!   CHANGELISTGET ── fetch changelist text
//!   CHANGECOMPILE ── Changelist::compile(local, upstream)
//!   CHANGEPROCESS ── Interpreter::run, then persist local_version
//! ```
//!
//! Compile failures stop the workflow before any interpreter exists, so no
//! directive runs against a half-understood changelist.

use std::path::PathBuf;
use std::sync::Arc;

use pack_fs::{ConfigStore, PathRoots, PathSandbox};
use pack_script::{
    Changelist, Decompressor, Downloader, Environment, Event, EventSink, Interpreter, RunReport,
    Status,
};
use serde_json::json;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::PackConfig;
use crate::context::AppContext;
use crate::error::{Error, Result};
use crate::version::{Version, VersionOrdering};

/// How an update attempt ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Upstream is not newer than the installed version.
    UpToDate { version: String },
    /// Upstream published an empty changelist; nothing was changed.
    EmptyChangelist,
    Updated {
        from: String,
        to: String,
        report: RunReport,
    },
}

/// Result of one pack in [`Updater::update_all`], with the pack as updated.
#[derive(Debug)]
pub struct PackUpdate {
    pub pack: PackConfig,
    pub result: Result<UpdateOutcome>,
}

/// Everything an update needs, detached from the [`AppContext`] so it can
/// move into concurrent tasks.
#[derive(Clone)]
pub struct Updater {
    downloader: Arc<dyn Downloader>,
    decompressor: Arc<dyn Decompressor>,
    store: ConfigStore,
    session_dir: PathBuf,
    data_dir: PathBuf,
    appdata_dir: PathBuf,
    ordering: VersionOrdering,
    max_import_depth: usize,
    max_workers: usize,
}

impl Updater {
    pub fn from_context(ctx: &AppContext) -> Self {
        Self {
            downloader: ctx.downloader(),
            decompressor: ctx.decompressor(),
            store: *ctx.store(),
            session_dir: ctx.session_dir(),
            data_dir: ctx.data_dir().to_path_buf(),
            appdata_dir: ctx.appdata_dir(),
            ordering: ctx.config().ordering(),
            max_import_depth: ctx.config().max_import_depth,
            max_workers: ctx.config().max_workers,
        }
    }

    /// The version listed under the pack's branch in its versioning file.
    ///
    /// The file alternates branch names and versions; the line after the
    /// one equal to `local_branch` is the upstream version.
    pub async fn upstream_version(&self, pack: &PackConfig) -> Result<String> {
        let text = self.downloader.fetch_text(&pack.upstream_version_url).await?;
        let lines: Vec<&str> = text.trim().lines().collect();
        let branch = pack.local_branch.trim();

        lines
            .iter()
            .position(|line| line.trim() == branch)
            .and_then(|index| lines.get(index + 1))
            .map(|version| version.trim().to_string())
            .ok_or_else(|| Error::BranchNotFound {
                id: pack.id.clone(),
                branch: pack.local_branch.clone(),
            })
    }

    /// The pack's versioning file as published.
    pub async fn upstream_version_file(&self, pack: &PackConfig) -> Result<String> {
        Ok(self.downloader.fetch_text(&pack.upstream_version_url).await?)
    }

    /// The pack's changelist as published.
    pub async fn upstream_changelist(&self, pack: &PackConfig) -> Result<String> {
        Ok(self.downloader.fetch_text(&pack.upstream_changelist).await?)
    }

    /// Latest packsync version published at `url`: the file's first
    /// non-blank line.
    pub async fn latest_app_version(&self, url: &str) -> Result<String> {
        let text = self.downloader.fetch_text(url).await?;
        let line = text.lines().map(str::trim).find(|line| !line.is_empty());
        Ok(line.unwrap_or_default().to_string())
    }

    /// Whether the version published at `url` is newer than `current`.
    pub async fn is_app_update_needed(&self, current: &str, url: &str) -> Result<bool> {
        let latest = self.latest_app_version(url).await?;
        let needed = self
            .ordering
            .is_newer(&Version::parse(&latest)?, &Version::parse(current)?);
        tracing::debug!(%current, %latest, needed, "checked packsync version");
        Ok(needed)
    }

    /// Fetch the upstream version, record it on `pack`, and compare it with
    /// the installed version.
    pub async fn is_update_needed(&self, pack: &mut PackConfig) -> Result<bool> {
        let upstream = self.upstream_version(pack).await?;
        let needed = self
            .ordering
            .is_newer(&Version::parse(&upstream)?, &pack.local_version()?);
        tracing::debug!(id = %pack.id, local = %pack.local_version, %upstream, needed, "checked upstream");
        pack.upstream_version = Some(upstream);
        Ok(needed)
    }

    /// Bring `pack` up to its upstream version.
    ///
    /// On success the new `local_version` is written to the pack's config
    /// file. A failed script leaves whatever it already changed on disk.
    pub async fn update_pack(&self, pack: &mut PackConfig, sink: &dyn EventSink) -> Result<UpdateOutcome> {
        pack.validate_id()?;
        if !self.is_update_needed(pack).await? {
            sink.emit(Event::info(Status::UpdateNotNeeded, vec![json!(pack.id)]));
            return Ok(UpdateOutcome::UpToDate {
                version: pack.local_version.clone(),
            });
        }
        let from = pack.local_version.clone();
        let to = pack.upstream_version.clone().unwrap_or_default();
        tracing::info!(id = %pack.id, %from, %to, "updating pack");

        sink.emit(Event::info(Status::ChangelistGetStart, vec![json!(pack.id)]));
        let text = match self.downloader.fetch_text(&pack.upstream_changelist).await {
            Ok(text) => text,
            Err(error) => {
                sink.emit(Event::error(Status::ChangelistGetFail, vec![json!(error.to_string())]));
                return Err(error.into());
            }
        };
        if text.trim().is_empty() {
            sink.emit(Event::info(Status::ChangelistGetEmpty, vec![json!(pack.id)]));
            return Ok(UpdateOutcome::EmptyChangelist);
        }
        sink.emit(Event::info(Status::ChangelistGetSucceed, vec![json!(pack.id)]));

        let compiled = Changelist::parse(&text).and_then(|changelist| {
            let script = changelist.compile(&from, &to)?;
            Ok((changelist, script))
        });
        let (changelist, script) = match compiled {
            Ok(compiled) => compiled,
            Err(error) => {
                sink.emit(Event::error(Status::ChangeCompileFail, vec![json!(error.to_string())]));
                return Err(error.into());
            }
        };
        sink.emit(Event::info(Status::ChangeCompileSucceed, vec![json!(script.len())]));

        let downloads = self.session_dir.join(&pack.id);
        tokio::fs::create_dir_all(&downloads).await?;
        let sandbox = PathSandbox::new(PathRoots::new(
            &downloads,
            &pack.instance_dir,
            pack.install_dir.clone().unwrap_or_default(),
            &self.appdata_dir,
            &self.data_dir,
        ));

        let interpreter = Interpreter::new(&sandbox, sink)
            .with_changelist(&changelist)
            .with_downloader(self.downloader.as_ref())
            .with_decompressor(self.decompressor.as_ref())
            .with_max_depth(self.max_import_depth);
        let mut env = Environment::new();
        let outcome = interpreter.run(script, &mut env).await;

        if let Err(error) = tokio::fs::remove_dir_all(&downloads).await {
            tracing::debug!(%error, "could not clean session downloads");
        }

        let report = match outcome {
            Ok(report) => report,
            Err(failure) => {
                sink.emit(Event::error(Status::ChangeProcessFail, vec![json!(failure.to_string())]));
                return Err(failure.into());
            }
        };

        pack.local_version = to.clone();
        pack.save(&self.store)?;
        sink.emit(Event::info(Status::ChangeProcessSucceed, vec![json!(pack.id), json!(to)]));
        tracing::info!(id = %pack.id, version = %to, executed = report.executed, "pack updated");

        Ok(UpdateOutcome::Updated { from, to, report })
    }

    /// Update each pack in its own task, at most `max_workers` at once.
    ///
    /// Results come back ordered by pack id.
    pub async fn update_all(&self, packs: Vec<PackConfig>, sink: Arc<dyn EventSink>) -> Vec<PackUpdate> {
        let permits = Arc::new(Semaphore::new(self.max_workers.max(1)));
        let mut tasks = JoinSet::new();

        for mut pack in packs {
            let updater = self.clone();
            let sink = Arc::clone(&sink);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let result = match permits.acquire_owned().await {
                    Ok(_permit) => updater.update_pack(&mut pack, sink.as_ref()).await,
                    Err(error) => Err(Error::Task {
                        message: error.to_string(),
                    }),
                };
                PackUpdate { pack, result }
            });
        }

        let mut updates = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(update) => updates.push(update),
                Err(error) => tracing::error!(%error, "pack update task panicked"),
            }
        }
        updates.sort_by(|a, b| a.pack.id.cmp(&b.pack.id));
        updates
    }
}
