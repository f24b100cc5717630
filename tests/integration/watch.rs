use scriptsync::error::ScriptError;
use scriptsync::progress::{ProgressEvent, RecordingProgress};
use scriptsync::remote::InMemoryScriptService;
use scriptsync::script::{Extractor, Resolver, ScriptBody, ScriptDescriptor, ScriptLanguage};
use scriptsync::sync::{
    FileEvent, ImportOptions, Pipeline, PipelineState, Publisher, ScriptSync, WatchMessage,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::{mpsc, watch};

fn write_pair(base: &Path, id: &str, name: &str) -> (PathBuf, PathBuf) {
    let descriptor = ScriptDescriptor::new(
        id,
        name,
        "OAUTH2_ACCESS_TOKEN_MODIFICATION",
        ScriptLanguage::Javascript,
        ScriptBody::Lines(vec!["var x = 1;".into(), "return x;".into()]),
    );
    let pair = Extractor::new(base)
        .extract(&descriptor, Path::new("scripts"))
        .unwrap();
    pair.write_descriptor().unwrap();
    (pair.descriptor_path, pair.body_path)
}

fn setup(base: &Path) -> (Arc<InMemoryScriptService>, Arc<RecordingProgress>, ScriptSync) {
    let service = Arc::new(InMemoryScriptService::new());
    let progress = Arc::new(RecordingProgress::new());
    let sync = ScriptSync::new(base, service.clone(), progress.clone());
    (service, progress, sync)
}

#[tokio::test]
async fn directory_import_creates_then_updates() {
    let temp = TempDir::new().unwrap();
    write_pair(temp.path(), "a1", "Header Injector");
    write_pair(temp.path(), "a2", "Claims Mapper");
    let (service, _, sync) = setup(temp.path());

    let first = sync
        .import_directory(Path::new("scripts"), ImportOptions::default())
        .await
        .unwrap();
    assert_eq!(first.state, PipelineState::Done);
    // Each pair is seen twice: once for the descriptor, once for the body.
    assert_eq!(first.matched, 4);
    assert_eq!(first.created, 2);
    assert_eq!(first.updated, 2);

    let second = sync
        .import_directory(Path::new("scripts"), ImportOptions::default())
        .await
        .unwrap();
    assert_eq!(second.created, 0);
    assert_eq!(second.updated, 4);
    assert_eq!(service.len(), 2);
}

#[tokio::test]
async fn duplicate_events_converge_on_one_record() {
    let temp = TempDir::new().unwrap();
    let (descriptor, body) = write_pair(temp.path(), "w1", "Header Injector");
    let service = Arc::new(InMemoryScriptService::new());
    let pipeline = Pipeline::new(
        Resolver::new(temp.path()),
        Publisher::new(service.clone()),
        ImportOptions::default(),
        false,
        Arc::new(RecordingProgress::new()),
    );

    let (tx, rx) = mpsc::channel(8);
    tx.send(WatchMessage::File(FileEvent::added(&descriptor))).await.unwrap();
    tx.send(WatchMessage::File(FileEvent::changed(&body))).await.unwrap();
    tx.send(WatchMessage::File(FileEvent::changed(&body))).await.unwrap();
    tx.send(WatchMessage::ScanComplete { matched: 2 }).await.unwrap();

    let report = pipeline.run(temp.path(), rx, None).await;
    assert_eq!(report.created, 1);
    assert_eq!(report.updated, 2);
    assert_eq!(service.len(), 1);
    assert_eq!(service.create_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn watch_session_keeps_ids_stable_across_saves() {
    let temp = TempDir::new().unwrap();
    let (_, body) = write_pair(temp.path(), "w2", "Header Injector");
    let (service, progress, sync) = setup(temp.path());
    service.seed(ScriptDescriptor::new(
        "w2",
        "Header Injector",
        "OAUTH2_ACCESS_TOKEN_MODIFICATION",
        ScriptLanguage::Javascript,
        ScriptBody::Lines(vec!["old".into()]),
    ));

    let options = ImportOptions {
        regenerate_ids: true,
        ..ImportOptions::default()
    };
    let (stop_tx, stop_rx) = watch::channel(false);
    let session = tokio::spawn(async move {
        sync.watch_directory(Path::new("scripts"), options, stop_rx)
            .await
    });

    // Initial scan publishes the descriptor and its body once each.
    let scanned = tokio::time::timeout(Duration::from_secs(10), async {
        while service.update_count() < 2 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(scanned.is_ok(), "initial scan was not reconciled");

    std::fs::write(&body, "var x = 2;\nreturn x;").unwrap();
    let saved = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let current = service.get("w2").map(|s| s.body);
            if current == Some(ScriptBody::Lines(vec!["var x = 2;".into(), "return x;".into()])) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(saved.is_ok(), "saved body was not published");

    stop_tx.send(true).unwrap();
    let report = session.await.unwrap().unwrap();

    assert_eq!(report.state, PipelineState::Stopped);
    assert_eq!(report.created, 0);
    assert_eq!(service.create_count(), 0);
    assert_eq!(service.len(), 1);
    assert_eq!(progress.events().last(), Some(&ProgressEvent::Stopped));
}

#[tokio::test]
async fn empty_directory_has_nothing_to_do() {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("scripts")).unwrap();
    std::fs::write(temp.path().join("scripts/readme.md"), "notes").unwrap();
    let (service, progress, sync) = setup(temp.path());

    let report = sync
        .import_directory(Path::new("scripts"), ImportOptions::default())
        .await
        .unwrap();
    assert_eq!(report.summary(), "Nothing to do");
    assert!(service.calls().is_empty());
    assert!(progress
        .events()
        .iter()
        .any(|e| matches!(e, ProgressEvent::NothingToDo { .. })));
}

#[tokio::test]
async fn missing_root_is_a_setup_error() {
    let temp = TempDir::new().unwrap();
    let (_, _, sync) = setup(temp.path());
    let result = sync
        .import_directory(Path::new("absent"), ImportOptions::default())
        .await;
    assert!(matches!(result, Err(ScriptError::WatchSetup(_))));
}

#[tokio::test]
async fn single_file_import_reports_missing_body() {
    let temp = TempDir::new().unwrap();
    let (descriptor, body) = write_pair(temp.path(), "m1", "Header Injector");
    std::fs::remove_file(&body).unwrap();
    let (service, _, sync) = setup(temp.path());

    let result = sync
        .import_file(&descriptor, ImportOptions::default())
        .await;
    match result {
        Err(ScriptError::MissingBodyFile { path, .. }) => assert_eq!(path, body),
        other => panic!("expected missing body file, got {:?}", other),
    }
    assert!(service.is_empty());
}

#[tokio::test]
async fn export_then_import_round_trips_through_the_service() {
    let temp = TempDir::new().unwrap();
    let (service, _, sync) = setup(temp.path());
    let original = ScriptDescriptor::new(
        "e1",
        "Exported Script",
        "OIDC_CLAIMS",
        ScriptLanguage::Groovy,
        ScriptBody::Lines(vec!["def claims = [:]".into(), "return claims".into()]),
    );
    service.seed(original.clone());

    let written = sync.export_all(Path::new("export"), true).await.unwrap();
    assert_eq!(written, vec![temp.path().join("export/Exported-Script.script.json")]);
    assert!(temp.path().join("export/Exported-Script.script.groovy").is_file());

    let outcome = sync
        .import_file(&written[0], ImportOptions::default())
        .await
        .unwrap();
    assert!(!outcome.is_created());
    assert_eq!(service.get("e1"), Some(original));
}
