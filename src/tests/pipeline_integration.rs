use crate::agent::Agent;
use crate::error::AgentError;
use crate::poll::PollConfig;
use crate::query::QueryPipeline;
use crate::settings::Settings;
use crate::tests::mock_backend::{MockBackend, MockBehavior};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn test_settings(dir: &TempDir) -> Settings {
    Settings {
        api_key: "test-key-0123456789".to_string(),
        data_dir: dir.path().join("data"),
        cache_dir: dir.path().join("cache"),
        log_level: "warn".to_string(),
        log_file: None,
        store_display_name: "test-docs".to_string(),
        model: "test-model".to_string(),
    }
}

async fn test_agent(backend: Arc<MockBackend>, dir: &TempDir) -> Agent<MockBackend> {
    Agent::with_backend(backend, &test_settings(dir), PollConfig::immediate()).await
}

fn write_pdf(dir: &Path, name: &str, contents: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[tokio::test]
async fn second_upload_of_unchanged_file_uses_the_cache() {
    let dir = TempDir::new().unwrap();
    let pdf = write_pdf(dir.path(), "doc.pdf", b"%PDF stable content");
    let backend = Arc::new(MockBackend::well_behaved());
    let mut agent = test_agent(Arc::clone(&backend), &dir).await;

    let first = agent.upload_file(&pdf).await.expect("first upload");
    let second = agent.upload_file(&pdf).await.expect("cached upload");

    assert_eq!(first, second);
    assert_eq!(backend.calls().upload, 1);
    assert_eq!(backend.calls().import, 1);
}

#[tokio::test]
async fn changed_content_triggers_reupload() {
    let dir = TempDir::new().unwrap();
    let pdf = write_pdf(dir.path(), "doc.pdf", b"%PDF version one");
    let backend = Arc::new(MockBackend::well_behaved());
    let mut agent = test_agent(Arc::clone(&backend), &dir).await;

    agent.upload_file(&pdf).await.expect("first upload");
    fs::write(&pdf, b"%PDF version two, edited").unwrap();
    agent.upload_file(&pdf).await.expect("re-upload");

    assert_eq!(backend.calls().upload, 2);
}

#[tokio::test]
async fn upload_directory_skips_invalid_files_without_aborting() {
    let dir = TempDir::new().unwrap();
    let docs = dir.path().join("docs");
    fs::create_dir(&docs).unwrap();
    write_pdf(&docs, "a.pdf", b"%PDF a");
    write_pdf(&docs, "b.pdf", b"%PDF b");
    write_pdf(&docs, "c.pdf", b"%PDF c");
    fs::write(docs.join("notes.txt"), b"not a pdf").unwrap();

    let backend = Arc::new(MockBackend::well_behaved());
    let mut agent = test_agent(Arc::clone(&backend), &dir).await;

    let results = agent.upload_directory(&docs).await;
    assert_eq!(results.len(), 3);
    assert_eq!(backend.calls().upload, 3);
    assert_eq!(agent.get_file_count(), 3);
}

#[tokio::test]
async fn upload_waits_out_the_processing_state() {
    let dir = TempDir::new().unwrap();
    let pdf = write_pdf(dir.path(), "doc.pdf", b"%PDF slow to process");
    let backend = Arc::new(MockBackend::new(MockBehavior {
        processing_polls: 1,
        ..Default::default()
    }));
    let mut agent = test_agent(Arc::clone(&backend), &dir).await;

    let result = agent.upload_file(&pdf).await;
    assert!(result.is_some());
    assert!(backend.calls().get_file >= 1);
}

#[tokio::test]
async fn failed_remote_processing_yields_none() {
    let dir = TempDir::new().unwrap();
    let pdf = write_pdf(dir.path(), "doc.pdf", b"%PDF doomed");
    let backend = Arc::new(MockBackend::new(MockBehavior {
        fail_processing: true,
        ..Default::default()
    }));
    let mut agent = test_agent(Arc::clone(&backend), &dir).await;

    assert!(agent.upload_file(&pdf).await.is_none());
    // Nothing is recorded for a failed upload.
    assert_eq!(agent.get_file_count(), 0);
}

#[tokio::test]
async fn failed_import_yields_none() {
    let dir = TempDir::new().unwrap();
    let pdf = write_pdf(dir.path(), "doc.pdf", b"%PDF unimportable");
    let backend = Arc::new(MockBackend::new(MockBehavior {
        fail_import: true,
        ..Default::default()
    }));
    let mut agent = test_agent(Arc::clone(&backend), &dir).await;

    assert!(agent.upload_file(&pdf).await.is_none());
    assert_eq!(agent.get_file_count(), 0);
}

#[tokio::test]
async fn degraded_mode_uploads_without_a_store() {
    let dir = TempDir::new().unwrap();
    let pdf = write_pdf(dir.path(), "doc.pdf", b"%PDF orphaned");
    let backend = Arc::new(MockBackend::new(MockBehavior {
        fail_store_init: true,
        ..Default::default()
    }));
    let mut agent = test_agent(Arc::clone(&backend), &dir).await;

    // Upload succeeds, but no import is attempted.
    assert!(agent.upload_file(&pdf).await.is_some());
    assert_eq!(backend.calls().import, 0);

    // Queries run without the retrieval tool attached.
    let answer = agent.ask_question("anything in here?", false).await.unwrap();
    assert_eq!(answer, "ungrounded answer");
}

#[tokio::test]
async fn clear_cache_empties_store_and_removes_file() {
    let dir = TempDir::new().unwrap();
    let pdf = write_pdf(dir.path(), "doc.pdf", b"%PDF tracked");
    let backend = Arc::new(MockBackend::well_behaved());
    let settings = test_settings(&dir);
    let mut agent =
        Agent::with_backend(Arc::clone(&backend), &settings, PollConfig::immediate()).await;

    agent.upload_file(&pdf).await.expect("upload");
    assert_eq!(agent.get_file_count(), 1);
    assert!(settings.tracking_path().exists());

    assert!(agent.clear_cache());
    assert!(agent.list_files().is_empty());
    assert_eq!(agent.get_file_count(), 0);
    assert!(!settings.tracking_path().exists());
}

#[tokio::test]
async fn list_files_reports_tracked_metadata() {
    let dir = TempDir::new().unwrap();
    let pdf = write_pdf(dir.path(), "doc.pdf", b"%PDF listed");
    let backend = Arc::new(MockBackend::well_behaved());
    let mut agent = test_agent(Arc::clone(&backend), &dir).await;

    agent.upload_file(&pdf).await.expect("upload");
    let files = agent.list_files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "files/mock-1");
    assert_eq!(files[0].uri, "uri://mock-1");
    assert!(files[0].original_path.ends_with("doc.pdf"));
}

#[tokio::test]
async fn grounded_question_attaches_the_store() {
    let dir = TempDir::new().unwrap();
    let backend = Arc::new(MockBackend::well_behaved());
    let agent = test_agent(Arc::clone(&backend), &dir).await;

    let answer = agent.ask_question("what does the doc say?", false).await.unwrap();
    assert_eq!(answer, "grounded answer");
    assert_eq!(backend.calls().generate, 1);
}

#[tokio::test]
async fn ask_with_retry_stops_after_max_retries() {
    let backend = Arc::new(MockBackend::new(MockBehavior {
        fail_generation: true,
        ..Default::default()
    }));
    let query = QueryPipeline::new(Arc::clone(&backend), "test-model");

    let err = query
        .ask_with_retry("doomed question", None, 3, Duration::ZERO)
        .await
        .expect_err("must exhaust retries");

    assert_eq!(backend.calls().generate, 3);
    match err {
        AgentError::RetriesExhausted { attempts, source } => {
            assert_eq!(attempts, 3);
            assert!(source.to_string().contains("model overloaded"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn facade_reports_retry_exhaustion_with_its_cause() {
    let dir = TempDir::new().unwrap();
    let backend = Arc::new(MockBackend::new(MockBehavior {
        fail_generation: true,
        ..Default::default()
    }));
    let agent = test_agent(Arc::clone(&backend), &dir).await;

    let message = agent
        .ask_question("doomed question", true)
        .await
        .expect_err("must fail after exhausting retries");
    assert!(message.contains("3 attempts"));
    assert!(message.contains("model overloaded"));
    assert_eq!(backend.calls().generate, 3);
}

#[tokio::test]
async fn answer_text_beginning_with_error_is_not_a_failure() {
    let dir = TempDir::new().unwrap();
    let backend = Arc::new(MockBackend::new(MockBehavior {
        canned_answer: Some("Error: in chapter 2 this term means a detected fault.".to_string()),
        ..Default::default()
    }));
    let agent = test_agent(Arc::clone(&backend), &dir).await;

    // An answer that happens to start with "Error:" is still a success.
    let answer = agent.ask_question("what does Error mean?", false).await;
    assert_eq!(
        answer.unwrap(),
        "Error: in chapter 2 this term means a detected fault."
    );
}

#[tokio::test]
async fn timed_out_import_still_records_the_upload() {
    let dir = TempDir::new().unwrap();
    let pdf = write_pdf(dir.path(), "doc.pdf", b"%PDF slow import");
    let backend = Arc::new(MockBackend::new(MockBehavior {
        import_never_completes: true,
        ..Default::default()
    }));
    let mut agent = test_agent(Arc::clone(&backend), &dir).await;

    // The wait ceiling passes without confirmation; the upload itself
    // succeeded, so the file is still tracked.
    let result = agent.upload_file(&pdf).await;
    assert!(result.is_some());
    assert_eq!(agent.get_file_count(), 1);
    assert!(backend.calls().get_operation >= 1);
}

#[tokio::test]
async fn processing_ceiling_hit_fails_the_upload() {
    let dir = TempDir::new().unwrap();
    let pdf = write_pdf(dir.path(), "doc.pdf", b"%PDF never ready");
    let backend = Arc::new(MockBackend::new(MockBehavior {
        stuck_processing: true,
        ..Default::default()
    }));
    let mut agent = test_agent(Arc::clone(&backend), &dir).await;

    assert!(agent.upload_file(&pdf).await.is_none());
    assert_eq!(agent.get_file_count(), 0);
    // The file never became importable.
    assert_eq!(backend.calls().import, 0);
}
