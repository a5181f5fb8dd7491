//! Scenario tests for update behaviour that spans crates.
//!
//! Each test drives `AppContext` against a fake upstream and checks what
//! ends up on disk and in the event stream.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pack_core::{AppContext, Error, UpdateOutcome};
use pack_fs::SandboxError;
use pack_script::{EventKind, ScriptError, Status};
use pack_test_utils::{FakeDecompressor, FakeDownloader, RecordingSink};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

// =============================================================================
// Test Infrastructure
// =============================================================================

const VERSION_URL: &str = "https://packs.example/demo/versions";
const CHANGELIST_URL: &str = "https://packs.example/demo/changelist";

struct Scenario {
    temp: TempDir,
}

impl Scenario {
    fn new() -> Self {
        Self {
            temp: TempDir::new().unwrap(),
        }
    }

    fn root(&self) -> &Path {
        self.temp.path()
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).unwrap()
    }

    /// Write the app config and a pack at `local` with extra TOML lines.
    fn pack(&self, local: &str, app_config: &str, extra: &str) -> PathBuf {
        self.write("data/config.toml", app_config);
        fs::create_dir_all(self.path("instance")).unwrap();
        self.write(
            "packs/demo.toml",
            &format!(
                "id = \"demo\"\nlocal_version = \"{local}\"\n\
                 upstream_version_url = \"{VERSION_URL}\"\n\
                 upstream_changelist = \"{CHANGELIST_URL}\"\n\
                 instance_dir = \"{}\"\n{extra}",
                self.path("instance").display()
            ),
        )
    }

    fn context(&self, upstream: &str, changelist: &str) -> AppContext {
        let downloader = FakeDownloader::new()
            .with(VERSION_URL, format!("Main\n{upstream}\n"))
            .with(CHANGELIST_URL, changelist)
            .with("https://packs.example/files/extra.zip", "zip bytes");
        let mut ctx = AppContext::load(Some(&self.path("data/config.toml")))
            .unwrap()
            .with_downloader(Arc::new(downloader))
            .with_decompressor(Arc::new(FakeDecompressor::new()));
        if ctx.pack("demo").is_err() {
            ctx.add_pack(&self.path("packs/demo.toml")).unwrap();
        }
        ctx
    }
}

// =============================================================================
// Sandbox
// =============================================================================

#[tokio::test]
async fn scenario_escape_is_blocked_and_nothing_outside_changes() {
    let outside = TempDir::new().unwrap();
    let victim = outside.path().join("victim.txt");
    fs::write(&victim, "keep me").unwrap();

    let s = Scenario::new();
    s.pack("1.0.0", "", "");
    let changelist = format!("1.0.0 -> 1.1.0\ndelete {}\n", victim.display());
    let mut ctx = s.context("1.1.0", &changelist);
    let sink = RecordingSink::new();

    let err = ctx.update_pack("demo", &sink).await.unwrap_err();
    match err {
        Error::Script(failure) => assert!(matches!(
            failure.error,
            ScriptError::Sandbox(SandboxError::Escape { .. })
        )),
        other => panic!("expected a script failure, got {other:?}"),
    }
    assert_eq!(fs::read_to_string(&victim).unwrap(), "keep me");
    assert_eq!(ctx.pack("demo").unwrap().local_version, "1.0.0");
}

#[tokio::test]
async fn scenario_parent_segments_stay_inside_instance() {
    let s = Scenario::new();
    s.pack("1.0.0", "", "");
    s.write("instance/notes.txt", "inside");
    let mut ctx = s.context("1.1.0", "1.0.0 -> 1.1.0\ndelete $I/../../notes.txt\n");

    ctx.update_pack("demo", &RecordingSink::new()).await.unwrap();
    assert!(!s.path("instance/notes.txt").exists());
}

#[tokio::test]
async fn scenario_install_root_is_disabled_without_install_dir() {
    let s = Scenario::new();
    s.pack("1.0.0", "", "");
    let mut ctx = s.context("1.1.0", "1.0.0 -> 1.1.0\ndelete $G/options.txt\n");

    let err = ctx.update_pack("demo", &RecordingSink::new()).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Script(ref failure) if matches!(failure.error, ScriptError::Sandbox(_))
    ));
}

#[tokio::test]
async fn scenario_install_root_when_configured() {
    let s = Scenario::new();
    s.write("game/options.txt", "fov:70\n");
    s.pack(
        "1.0.0",
        "",
        &format!("install_dir = \"{}\"\n", s.path("game").display()),
    );
    let mut ctx = s.context(
        "1.1.0",
        "1.0.0 -> 1.1.0\nsplice $G/options.txt 1 `fov:95`\n",
    );

    ctx.update_pack("demo", &RecordingSink::new()).await.unwrap();
    assert_eq!(s.read("game/options.txt"), "fov:95\n");
}

// =============================================================================
// Failure semantics
// =============================================================================

#[tokio::test]
async fn scenario_failed_script_keeps_completed_steps() {
    let s = Scenario::new();
    s.pack("1.0.0", "", "");
    s.write("instance/a.txt", "a");
    let mut ctx = s.context(
        "1.1.0",
        "1.0.0 -> 1.1.0\nmove $I/a.txt $I/b.txt\nexplode now\nlog never\n",
    );
    let sink = RecordingSink::new();

    let err = ctx.update_pack("demo", &sink).await.unwrap_err();
    match err {
        Error::Script(failure) => {
            assert_eq!(failure.line, 1);
            assert_eq!(failure.directive, "explode now");
            assert!(matches!(failure.error, ScriptError::UnknownCommand(_)));
        }
        other => panic!("expected a script failure, got {other:?}"),
    }

    assert!(s.path("instance/b.txt").exists());
    assert!(!s.path("instance/a.txt").exists());
    assert!(sink.messages(EventKind::Log).is_empty());
    assert_eq!(sink.errors().len(), 2);
    assert!(sink.has_status(Status::ChangeProcessFail));
}

#[tokio::test]
async fn scenario_failure_inside_import_names_the_import() {
    let s = Scenario::new();
    s.pack("1.0.0", "", "");
    let changelist = "\
1.0.0 -> 1.1.0
import 0.0.0 0.0.1
log unreachable
0.0.0 -> 0.0.1
delete $I/missing.txt
";
    let mut ctx = s.context("1.1.0", changelist);

    let err = ctx.update_pack("demo", &RecordingSink::new()).await.unwrap_err();
    let Error::Script(failure) = err else {
        panic!("expected a script failure");
    };
    assert!(matches!(failure.error, ScriptError::SubScript { .. }));
    assert!(matches!(failure.error.root_cause(), ScriptError::Io { .. }));
}

// =============================================================================
// Imports and environment
// =============================================================================

#[tokio::test]
async fn scenario_shared_snippet_imported_by_two_versions() {
    let s = Scenario::new();
    s.pack("1.0.0", "", "");
    let changelist = "\
0.0.0 -> 0.0.1
download $extra https://packs.example/files/extra.zip
decompress v $extra $I/extra
1.0.0 -> 1.1.0
set target \"1.1.0\"
import 0.0.0 0.0.1
log `installed extras for ${target}`
1.1.0 -> 1.2.0
import 0.0.0 0.0.1
";
    let mut ctx = s.context("1.2.0", changelist);
    let sink = RecordingSink::new();

    let outcome = ctx.update_pack("demo", &sink).await.unwrap();
    let UpdateOutcome::Updated { report, .. } = outcome else {
        panic!("expected an update");
    };
    assert_eq!(report.imports, 2);
    assert_eq!(sink.messages(EventKind::Log), vec!["installed extras for 1.1.0"]);
    assert_eq!(
        sink.statuses()
            .into_iter()
            .filter(|s| *s == Status::ParserContextEnter)
            .count(),
        2
    );
    assert_eq!(s.read("instance/extra/extra.zip"), "zip bytes");
}

#[tokio::test]
async fn scenario_import_depth_comes_from_app_config() {
    let s = Scenario::new();
    s.pack("1.0.0", "max_import_depth = 1\n", "");
    let changelist = "\
1.0.0 -> 1.1.0
import 0.0.0 0.0.1
0.0.0 -> 0.0.1
import 0.0.1 0.0.2
0.0.1 -> 0.0.2
log deep
";
    let mut ctx = s.context("1.1.0", changelist);

    let err = ctx.update_pack("demo", &RecordingSink::new()).await.unwrap_err();
    let Error::Script(failure) = err else {
        panic!("expected a script failure");
    };
    assert!(matches!(
        failure.error.root_cause(),
        ScriptError::ImportDepthExceeded { limit: 1 }
    ));
}

// =============================================================================
// Version ordering
// =============================================================================

#[tokio::test]
async fn scenario_prerelease_upgrades_to_release() {
    let s = Scenario::new();
    s.pack("2.0.0-beta3", "", "");
    let mut ctx = s.context("2.0.0", "2.0.0-beta3 -> 2.0.0\nlog released\n");

    let outcome = ctx.update_pack("demo", &RecordingSink::new()).await.unwrap();
    assert!(matches!(outcome, UpdateOutcome::Updated { .. }));
    assert_eq!(ctx.pack("demo").unwrap().local_version, "2.0.0");
}

#[tokio::test]
async fn scenario_legacy_ordering_from_config_file() {
    let s = Scenario::new();
    s.pack("2.0.0", "legacy_version_ordering = true\n", "");
    let mut ctx = s.context("1.0.5", "2.0.0 -> 1.0.5\nlog downgrade\n");
    assert!(ctx.config().legacy_version_ordering);

    let sink = RecordingSink::new();
    ctx.update_pack("demo", &sink).await.unwrap();
    assert_eq!(sink.messages(EventKind::Log), vec!["downgrade"]);
    assert_eq!(ctx.pack("demo").unwrap().local_version, "1.0.5");
}

#[tokio::test]
async fn scenario_branch_selection() {
    let s = Scenario::new();
    s.pack("1.0.0", "", "local_branch = \"Beta\"\n");
    let downloader = FakeDownloader::new()
        .with(VERSION_URL, "Main\n1.0.0\nBeta\n1.1.0-beta1\n")
        .with(CHANGELIST_URL, "1.0.0 -> 1.1.0-beta1\nlog beta\n");
    let mut ctx = AppContext::load(Some(&s.path("data/config.toml")))
        .unwrap()
        .with_downloader(Arc::new(downloader));
    ctx.add_pack(&s.path("packs/demo.toml")).unwrap();

    assert!(ctx.check_pack("demo").await.unwrap());
    assert_eq!(
        ctx.pack("demo").unwrap().upstream_version.as_deref(),
        Some("1.1.0-beta1")
    );
}
