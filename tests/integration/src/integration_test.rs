//! End-to-end integration test for the vertical slice
//!
//! Pack config on disk -> upstream check -> changelist compile -> script run
//! with the real file transport and zip extraction -> version persisted.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pack_core::{AppContext, UpdateOutcome};
use pack_script::{EventKind, Status};
use pack_test_utils::RecordingSink;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn write_zip(path: &Path, entries: &[(&str, &str)]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
    for (name, content) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

/// An upstream directory serving a versioning file, a changelist and the
/// files it downloads, plus a registered pack at 1.0.0.
struct Deployment {
    temp: TempDir,
}

impl Deployment {
    fn new(changelist: &str) -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let upstream = root.join("upstream");

        write(&upstream.join("versions.txt"), "Beta\n3.0.0-beta1\nMain\n2.0.0\n");
        write(&upstream.join("changelist.txt"), &changelist.replace("@UP", &upstream.display().to_string()));
        write(&upstream.join("files/new.jar"), "new mod");
        write_zip(
            &upstream.join("files/config.zip"),
            &[("options.txt", "fov:70\nvolume:1\n"), ("keys/binds.txt", "jump=space")],
        );

        write(&root.join("instance/mods/old.jar"), "old mod");
        write(
            &root.join("packs/demo.toml"),
            &format!(
                "id = \"demo\"\nname = \"Demo\"\nlocal_version = \"1.0.0\"\n\
                 upstream_version_url = \"file://{up}/versions.txt\"\n\
                 upstream_changelist = \"file://{up}/changelist.txt\"\n\
                 instance_dir = \"{inst}\"\n",
                up = upstream.display(),
                inst = root.join("instance").display()
            ),
        );
        Self { temp }
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.temp.path().join(rel)
    }

    fn context(&self) -> AppContext {
        let mut ctx = AppContext::load(Some(&self.path("data/config.toml"))).unwrap();
        ctx.config_mut().retry.max_retries = 0;
        if ctx.pack("demo").is_err() {
            ctx.add_pack(&self.path("packs/demo.toml")).unwrap();
        }
        ctx
    }
}

const CHANGELIST: &str = "\
1.0.0 -> 1.5.0\r
log `Installing 1.5.0`\r
download $I/mods/new.jar @UP/files/new.jar\r
delete $I/mods/old.jar\r
download $cfg @UP/files/config.zip\r
decompress v $cfg $I/config\r
1.5.0 -> 2.0.0\r
regex $I/config/options.txt `fov:\\d+` `fov:90`\r
set greeting \"welcome to 2.0.0\"\r
log ${greeting}\r
";

#[tokio::test]
async fn test_full_update_through_intermediate_version() {
    let deployment = Deployment::new(CHANGELIST);
    let mut ctx = deployment.context();
    let sink = RecordingSink::new();

    assert!(ctx.check_pack("demo").await.unwrap());
    assert_eq!(ctx.pack("demo").unwrap().upstream_version.as_deref(), Some("2.0.0"));

    let outcome = ctx.update_pack("demo", &sink).await.unwrap();
    assert!(matches!(outcome, UpdateOutcome::Updated { ref to, .. } if to == "2.0.0"));

    assert_eq!(fs::read_to_string(deployment.path("instance/mods/new.jar")).unwrap(), "new mod");
    assert!(!deployment.path("instance/mods/old.jar").exists());
    assert_eq!(
        fs::read_to_string(deployment.path("instance/config/options.txt")).unwrap(),
        "fov:90\nvolume:1\n"
    );
    assert_eq!(
        fs::read_to_string(deployment.path("instance/config/keys/binds.txt")).unwrap(),
        "jump=space"
    );
    assert_eq!(
        sink.messages(EventKind::Log),
        vec!["Installing 1.5.0", "welcome to 2.0.0"]
    );
    assert!(sink.errors().is_empty());
    assert!(!deployment.path("data/session/demo").exists());

    // a fresh context sees the persisted version and has nothing to do
    let mut reopened = deployment.context();
    assert_eq!(reopened.pack("demo").unwrap().local_version, "2.0.0");
    let sink = RecordingSink::new();
    let outcome = reopened.update_pack("demo", &sink).await.unwrap();
    assert_eq!(outcome, UpdateOutcome::UpToDate { version: "2.0.0".into() });
    assert_eq!(sink.statuses(), vec![Status::UpdateNotNeeded]);
}

#[tokio::test]
async fn test_progress_events_cover_every_directive() {
    let deployment = Deployment::new(CHANGELIST);
    let mut ctx = deployment.context();
    let sink = RecordingSink::new();

    ctx.update_pack("demo", &sink).await.unwrap();

    let progress: Vec<serde_json::Value> = sink
        .events()
        .into_iter()
        .filter(|event| event.status == Some(Status::ParserStatus))
        .map(|event| event.payload[0].clone())
        .collect();
    assert_eq!(progress, (0..8).map(serde_json::Value::from).collect::<Vec<_>>());
    assert!(sink.has_status(Status::ParserComplete));
}

#[tokio::test]
async fn test_update_all_with_real_transport() {
    let deployment = Deployment::new(CHANGELIST);
    let mut ctx = deployment.context();

    let results = ctx.update_all(Arc::new(RecordingSink::new())).await;
    assert_eq!(results.len(), 1);
    assert!(matches!(results[0].1, Ok(UpdateOutcome::Updated { .. })));
    assert_eq!(ctx.pack("demo").unwrap().local_version, "2.0.0");
}
