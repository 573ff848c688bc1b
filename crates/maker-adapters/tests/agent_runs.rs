//! End-to-end runs: agent + built-in templates + adapters.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use maker_adapters::{
    LocalFilesystem, MemoryFilesystem, RecordingSink, ScriptedClient, ZipPackager, load_catalog,
};
use maker_core::{
    application::ApplicationError,
    error::MakerError,
    prelude::*,
};
use tempfile::TempDir;

const GO_GIN_FILES: [&str; 5] = [
    "go.mod",
    "main.go",
    "internal/handlers/handlers.go",
    "internal/models/models.go",
    "README.md",
];

fn catalog() -> Arc<TemplateCatalog> {
    Arc::new(load_catalog(None).unwrap())
}

fn gin_config(root: &Path, workers: usize) -> AgentConfig {
    AgentConfig::default()
        .with_output_root(root)
        .with_project_name("books".parse().unwrap())
        .with_template("go-gin", "go")
        .with_base_package("github.com/acme/books")
        .with_workers(workers)
}

fn fixed_text_client() -> ScriptedClient {
    GO_GIN_FILES
        .iter()
        .fold(ScriptedClient::new(), |c, path| c.respond(path, format!("content of {path}")))
}

fn file_events(events: &[ProgressEvent]) -> Vec<(String, usize, usize)> {
    events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::File {
                path,
                completed,
                total,
            } => Some((path.to_string(), *completed, *total)),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn go_gin_books_scenario_writes_five_files() {
    let temp = TempDir::new().unwrap();
    let sink = RecordingSink::new();

    let agent = Agent::new(
        gin_config(temp.path(), 2).with_download_base("/download"),
        Arc::new(fixed_text_client()),
        catalog(),
        Arc::new(LocalFilesystem::new()),
        Arc::new(sink.clone()),
    )
    .unwrap();

    agent.start();
    let summary = agent.generate_code("CRUD API for books").await.unwrap();
    let report = agent.stop().await;

    assert_eq!(summary.succeeded(), 5);
    assert!(report.is_clean());
    assert_eq!(sink.flushes(), 1);

    let project = temp.path().join("books");
    for path in GO_GIN_FILES {
        let content = std::fs::read_to_string(project.join(path)).unwrap();
        assert_eq!(content, format!("content of {path}"));
    }

    match sink.last() {
        Some(ProgressEvent::Complete { summary, download }) => {
            assert_eq!(summary.status, RunState::Completed);
            assert_eq!(download.as_deref(), Some("/download/books"));
        }
        other => panic!("expected complete, got {other:?}"),
    }
}

#[tokio::test]
async fn every_pool_size_yields_one_result_per_file() {
    for workers in 1..=5 {
        let fs = MemoryFilesystem::new();
        let sink = RecordingSink::new();
        let agent = Agent::new(
            gin_config(Path::new("/out"), workers),
            Arc::new(ScriptedClient::new()),
            catalog(),
            Arc::new(fs.clone()),
            Arc::new(sink.clone()),
        )
        .unwrap();

        agent.start();
        agent.generate_code("CRUD API for books").await.unwrap();
        agent.stop().await;

        let files = file_events(&sink.events());
        assert_eq!(files.len(), 5, "workers={workers}");
        assert_eq!(fs.list_files().len(), 5);
        assert_eq!(fs.write_count(), 5, "each path written exactly once");
    }
}

#[tokio::test]
async fn events_are_ordered_with_single_terminal() {
    let sink = RecordingSink::new();
    let agent = Agent::new(
        gin_config(Path::new("/out"), 3),
        Arc::new(ScriptedClient::new().delay(Duration::from_millis(5))),
        catalog(),
        Arc::new(MemoryFilesystem::new()),
        Arc::new(sink.clone()),
    )
    .unwrap();

    agent.start();
    agent.generate_code("CRUD API for books").await.unwrap();
    agent.stop().await;

    let kinds = sink.kinds();
    assert_eq!(kinds.first(), Some(&"start"));
    assert_eq!(kinds.last(), Some(&"complete"));
    assert_eq!(kinds.iter().filter(|k| **k == "complete").count(), 1);

    let completed: Vec<_> = file_events(&sink.events()).iter().map(|f| f.1).collect();
    assert_eq!(completed, [1, 2, 3, 4, 5]);
    assert!(file_events(&sink.events()).iter().all(|f| f.2 == 5));
}

#[tokio::test]
async fn concurrency_never_exceeds_worker_count() {
    let client = Arc::new(ScriptedClient::new().delay(Duration::from_millis(25)));
    let agent = Agent::new(
        gin_config(Path::new("/out"), 2),
        client.clone(),
        catalog(),
        Arc::new(MemoryFilesystem::new()),
        Arc::new(RecordingSink::new()),
    )
    .unwrap();

    agent.start();
    agent.generate_code("CRUD API for books").await.unwrap();
    agent.stop().await;

    assert_eq!(client.calls(), 5);
    assert!(client.peak_concurrency() <= 2);
}

#[tokio::test]
async fn one_failure_leaves_siblings_written() {
    let fs = MemoryFilesystem::new();
    let sink = RecordingSink::new();
    let client = ScriptedClient::new().fail("main.go", GenerationError::fatal("invalid api key"));

    let agent = Agent::new(
        gin_config(Path::new("/out"), 2),
        Arc::new(client),
        catalog(),
        Arc::new(fs.clone()),
        Arc::new(sink.clone()),
    )
    .unwrap();

    agent.start();
    let err = agent.generate_code("CRUD API for books").await.unwrap_err();
    agent.stop().await;

    match &err {
        MakerError::Application(ApplicationError::PartialGeneration {
            failed,
            succeeded,
            total,
        }) => {
            assert_eq!((*succeeded, *total), (4, 5));
            assert_eq!(failed.len(), 1);
            assert_eq!(failed[0].path.as_str(), "main.go");
            assert_eq!(failed[0].kind, Some(FailureKind::Fatal));
        }
        other => panic!("expected partial generation, got {other:?}"),
    }
    assert!(err.to_string().contains("main.go: fatal generation error: invalid api key"));

    assert!(!fs.exists(Path::new("/out/books/main.go")));
    assert_eq!(fs.list_files().len(), 4);

    let kinds = sink.kinds();
    assert_eq!(kinds.iter().filter(|k| **k == "error").count(), 1);
    assert!(matches!(
        sink.last(),
        Some(ProgressEvent::Complete { ref summary, download: None }) if summary.status == RunState::Failed
    ));
}

#[tokio::test]
async fn write_failures_are_reported_like_generation_failures() {
    let fs = MemoryFilesystem::new();
    fs.deny_writes_under("/out/books/internal");
    let sink = RecordingSink::new();

    let agent = Agent::new(
        gin_config(Path::new("/out"), 4),
        Arc::new(ScriptedClient::new()),
        catalog(),
        Arc::new(fs.clone()),
        Arc::new(sink.clone()),
    )
    .unwrap();

    agent.start();
    let err = agent.generate_code("CRUD API for books").await.unwrap_err();
    agent.stop().await;

    let mut failed: Vec<_> = err.failed_files().iter().map(|f| f.path.as_str()).collect();
    failed.sort();
    assert_eq!(failed, ["internal/handlers/handlers.go", "internal/models/models.go"]);
    assert!(err.failed_files().iter().all(|f| f.kind.is_none()));
    assert_eq!(fs.list_files().len(), 3);
}

#[tokio::test]
async fn slow_file_times_out_as_transient() {
    let fs = MemoryFilesystem::new();
    let agent = Agent::new(
        gin_config(Path::new("/out"), 2).with_timeout(Duration::from_millis(100)),
        Arc::new(ScriptedClient::new().hang("README.md")),
        catalog(),
        Arc::new(fs.clone()),
        Arc::new(RecordingSink::new()),
    )
    .unwrap();

    agent.start();
    let err = agent.generate_code("CRUD API for books").await.unwrap_err();
    agent.stop().await;

    let failed = err.failed_files();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].path.as_str(), "README.md");
    assert_eq!(failed[0].kind, Some(FailureKind::Transient));
    assert_eq!(fs.list_files().len(), 4);
}

#[tokio::test]
async fn cancellation_keeps_written_files_and_reports_cancelled() {
    let fs = MemoryFilesystem::new();
    let sink = RecordingSink::new();
    let agent = Arc::new(
        Agent::new(
            gin_config(Path::new("/out"), 2),
            Arc::new(ScriptedClient::new().hang("main.go")),
            catalog(),
            Arc::new(fs.clone()),
            Arc::new(sink.clone()),
        )
        .unwrap(),
    );

    agent.start();
    let handle = agent.cancel_handle();
    let run = tokio::spawn({
        let agent = Arc::clone(&agent);
        async move { agent.generate_code("CRUD API for books").await }
    });

    // Everything except the hanging file finishes quickly.
    tokio::time::timeout(Duration::from_secs(5), async {
        while fs.list_files().len() < 4 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("siblings were not written");

    handle.cancel();
    let err = run.await.unwrap().unwrap_err();
    agent.stop().await;

    assert!(err.is_cancelled());
    assert_eq!(agent.state(), AgentState::Stopped);
    assert!(!fs.exists(Path::new("/out/books/main.go")));
    assert_eq!(fs.list_files().len(), 4);
    assert!(matches!(
        sink.last(),
        Some(ProgressEvent::Complete { ref summary, .. }) if summary.status == RunState::Cancelled
    ));
}

#[tokio::test]
async fn overlapping_generate_is_already_running() {
    let fs = MemoryFilesystem::new();
    let sink = RecordingSink::new();
    let agent = Arc::new(
        Agent::new(
            gin_config(Path::new("/out"), 2),
            Arc::new(ScriptedClient::new().hang("main.go")),
            catalog(),
            Arc::new(fs.clone()),
            Arc::new(sink.clone()),
        )
        .unwrap(),
    );

    agent.start();
    let first = tokio::spawn({
        let agent = Arc::clone(&agent);
        async move { agent.generate_code("CRUD API for books").await }
    });

    tokio::time::timeout(Duration::from_secs(5), async {
        while agent.state() != AgentState::Generating {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("first run never started generating");

    let err = agent.generate_code("a second project").await.unwrap_err();
    assert!(matches!(err, MakerError::Application(ApplicationError::AlreadyRunning)));
    assert_eq!(agent.state(), AgentState::Generating);

    agent.cancel_handle().cancel();
    assert!(first.await.unwrap().unwrap_err().is_cancelled());
    agent.stop().await;

    // The rejected call emitted nothing of its own.
    let starts = sink.kinds().iter().filter(|k| **k == "start").count();
    assert_eq!(starts, 1);
    assert!(!fs.exists(Path::new("/out/books/main.go")));
}

#[tokio::test]
async fn stop_during_run_cancels_it() {
    let agent = Arc::new(
        Agent::new(
            gin_config(Path::new("/out"), 1),
            Arc::new(ScriptedClient::new().hang("go.mod")),
            catalog(),
            Arc::new(MemoryFilesystem::new()),
            Arc::new(RecordingSink::new()),
        )
        .unwrap(),
    );

    agent.start();
    let run = tokio::spawn({
        let agent = Arc::clone(&agent);
        async move { agent.generate_code("CRUD API for books").await }
    });
    tokio::time::sleep(Duration::from_millis(30)).await;

    tokio::time::timeout(Duration::from_secs(5), agent.stop())
        .await
        .expect("stop did not return");
    let err = run.await.unwrap().unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(agent.state(), AgentState::Stopped);
}

#[tokio::test]
async fn a_departed_consumer_does_not_fail_the_run() {
    let fs = MemoryFilesystem::new();
    let sink = RecordingSink::closing_after(2);
    let agent = Agent::new(
        gin_config(Path::new("/out"), 2),
        Arc::new(ScriptedClient::new()),
        catalog(),
        Arc::new(fs.clone()),
        Arc::new(sink.clone()),
    )
    .unwrap();

    agent.start();
    let summary = agent.generate_code("CRUD API for books").await.unwrap();
    let report = agent.stop().await;

    assert_eq!(summary.succeeded(), 5);
    assert_eq!(fs.list_files().len(), 5);
    assert_eq!(report.delivered, 2);
    assert_eq!(report.failure, Some(SinkError::Closed));
    assert_eq!(sink.events().len(), 2);
}

#[tokio::test]
async fn rerun_overwrites_previous_output() {
    let temp = TempDir::new().unwrap();
    for round in ["first", "second"] {
        let client = ScriptedClient::new().respond("go.mod", format!("module {round}"));
        let agent = Agent::new(
            gin_config(temp.path(), 2),
            Arc::new(client),
            catalog(),
            Arc::new(LocalFilesystem::new()),
            Arc::new(RecordingSink::new()),
        )
        .unwrap();
        agent.start();
        agent.generate_code("CRUD API for books").await.unwrap();
        agent.stop().await;
    }

    let go_mod = std::fs::read_to_string(temp.path().join("books/go.mod")).unwrap();
    assert_eq!(go_mod, "module second");
}

#[tokio::test]
async fn prompts_carry_project_details_and_conventions() {
    let client = Arc::new(ScriptedClient::new());
    let agent = Agent::new(
        gin_config(Path::new("/out"), 1),
        client.clone(),
        catalog(),
        Arc::new(MemoryFilesystem::new()),
        Arc::new(RecordingSink::new()),
    )
    .unwrap();

    agent.start();
    agent.generate_code("CRUD API for books").await.unwrap();
    agent.stop().await;

    let prompts = client.prompts();
    assert_eq!(prompts.len(), 5);
    for (system, user) in &prompts {
        assert!(system.contains("gin-gonic/gin"));
        assert!(user.contains("CRUD API for books"));
        assert!(user.contains("github.com/acme/books"));
    }
}

#[tokio::test]
async fn finished_run_packages_into_zip() {
    let temp = TempDir::new().unwrap();
    let agent = Agent::new(
        gin_config(temp.path(), 2),
        Arc::new(fixed_text_client()),
        catalog(),
        Arc::new(LocalFilesystem::new()),
        Arc::new(RecordingSink::new()),
    )
    .unwrap();
    agent.start();
    let summary = agent.generate_code("CRUD API for books").await.unwrap();
    agent.stop().await;

    let bytes = ZipPackager::new().package(&summary.output_dir).unwrap();
    let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut names: Vec<_> = archive.file_names().map(str::to_string).collect();
    names.sort();

    let mut expected = GO_GIN_FILES.map(str::to_string).to_vec();
    expected.sort();
    assert_eq!(names, expected);
}

#[tokio::test]
async fn unknown_template_and_language_fail_before_any_event() {
    for (template, language) in [("nope", "go"), ("go-gin", "python")] {
        let sink = RecordingSink::new();
        let client = Arc::new(ScriptedClient::new());
        let agent = Agent::new(
            gin_config(Path::new("/out"), 2).with_template(template, language),
            client.clone(),
            catalog(),
            Arc::new(MemoryFilesystem::new()),
            Arc::new(sink.clone()),
        )
        .unwrap();

        agent.start();
        let err = agent.generate_code("CRUD API for books").await.unwrap_err();
        agent.stop().await;

        assert!(err.is_config_error(), "{template}/{language}");
        assert_eq!(client.calls(), 0);
        assert!(sink.events().is_empty());
    }
}
