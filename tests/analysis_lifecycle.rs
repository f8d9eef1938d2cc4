//! End-to-end analysis scenarios against a SQLite database file
//!
//! Run with: `cargo test --test analysis_lifecycle`

#![cfg(not(feature = "real_llm"))]

mod common;

use common::{mario_client, Workspace};
use docanalysis::extraction::MockClient;
use docanalysis::{
    AnalysisError, AnalysisLifecycle, DocumentStatus, DocumentStore, EntityKey,
};
use std::collections::HashSet;
use std::sync::Arc;

#[tokio::test]
async fn register_analyze_and_approve() {
    let ws = Workspace::new();
    let id = ws.register("mario.txt", "Mario lives in Rome.").await;
    let orchestrator = ws.orchestrator(mario_client());

    let document = orchestrator.run_analysis(&id).await.unwrap();
    assert_eq!(document.status, DocumentStatus::Completed);

    let analysis = document.analysis.unwrap();
    let keys = analysis.entity_keys();
    assert_eq!(analysis.entities.len(), 3, "Mario must appear once");
    assert!(keys.contains(&EntityKey::new("Mario", "Person")));
    assert!(keys.contains(&EntityKey::new("Rome", "Place")));
    assert!(keys.contains(&EntityKey::new("living", "Situation")));
    assert_eq!(analysis.relations.len(), 2, "relations are never deduplicated");
    assert_eq!(analysis.relations[0], analysis.relations[1]);

    let view = orchestrator
        .commit_analysis(&id, true, Some("Checked against source".into()))
        .await
        .unwrap();
    assert_eq!(view.status, DocumentStatus::Approved);
    assert_eq!(view.result().unwrap(), &analysis);
}

#[tokio::test]
async fn failed_extraction_then_retry() {
    let ws = Workspace::new();
    let id = ws.register("mario.txt", "Mario lives in Rome.").await;

    let failing = MockClient::new()
        .with_reply("relations", "{}")
        .with_failure("situations", "upstream returned 503");
    let err = ws.orchestrator(failing).run_analysis(&id).await.unwrap_err();

    assert!(matches!(err, AnalysisError::ExtractionFailed(_)));
    assert!(!err.to_string().contains("503"));
    let document = ws.store.find(&id).await.unwrap().unwrap();
    assert_eq!(document.status, DocumentStatus::Failed);
    assert!(document.analysis.is_none());

    let document = ws.orchestrator(mario_client()).run_analysis(&id).await.unwrap();
    assert_eq!(document.status, DocumentStatus::Completed);
}

#[tokio::test]
async fn unreadable_model_reply_fails_document() {
    let ws = Workspace::new();
    let id = ws.register("mario.txt", "Mario lives in Rome.").await;

    let garbled = MockClient::new()
        .with_reply("relations", "I could not find any entities.")
        .with_reply("situations", "{}");
    let err = ws.orchestrator(garbled).run_analysis(&id).await.unwrap_err();

    assert_eq!(err.status_code(), 408);
    let document = ws.store.find(&id).await.unwrap().unwrap();
    assert_eq!(document.status, DocumentStatus::Failed);
}

#[tokio::test]
async fn deleted_upload_reports_file_missing() {
    let ws = Workspace::new();
    let id = ws.register("mario.txt", "Mario lives in Rome.").await;
    ws.remove_upload(&id).await;

    let err = ws.orchestrator(mario_client()).run_analysis(&id).await.unwrap_err();

    assert!(matches!(err, AnalysisError::FileMissing { document_id, .. } if document_id == id));
    assert_eq!(err.status_code(), 424);
    let document = ws.store.find(&id).await.unwrap().unwrap();
    assert_eq!(document.status, DocumentStatus::Failed);
}

#[tokio::test]
async fn unsupported_format_fails_document() {
    let ws = Workspace::new();
    let id = ws.register("scan.pdf", "%PDF-1.7").await;

    let err = ws.orchestrator(mario_client()).run_analysis(&id).await.unwrap_err();

    assert!(matches!(err, AnalysisError::ExtractionFailed(_)));
    assert_eq!(
        ws.store.find(&id).await.unwrap().unwrap().status,
        DocumentStatus::Failed
    );
}

#[tokio::test]
async fn commit_rules_follow_document_status() {
    let ws = Workspace::new();
    let lifecycle = AnalysisLifecycle::new(ws.store.clone());

    let draft = ws.register("draft.txt", "Nothing yet.").await;
    let err = lifecycle.commit_analysis(&draft, true, None).await.unwrap_err();
    assert!(matches!(err, AnalysisError::NotFound(_)));

    let busy = ws.register("busy.txt", "In flight.").await;
    lifecycle.begin_analysis(&busy).await.unwrap();
    let err = lifecycle.commit_analysis(&busy, true, None).await.unwrap_err();
    assert!(matches!(err, AnalysisError::Conflict(_)));
}

#[tokio::test]
async fn begin_on_submitted_never_mutates() {
    let ws = Workspace::new();
    let id = ws.register("busy.txt", "In flight.").await;
    let lifecycle = AnalysisLifecycle::new(ws.store.clone());
    lifecycle.begin_analysis(&id).await.unwrap();
    let before = ws.store.find(&id).await.unwrap().unwrap();

    for _ in 0..3 {
        let err = lifecycle.begin_analysis(&id).await.unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    assert_eq!(ws.store.find(&id).await.unwrap().unwrap(), before);
}

#[tokio::test]
async fn rejected_analysis_can_be_rerun() {
    let ws = Workspace::new();
    let id = ws.register("mario.txt", "Mario lives in Rome.").await;
    let orchestrator = ws.orchestrator(mario_client());

    orchestrator.run_analysis(&id).await.unwrap();
    let view = orchestrator
        .commit_analysis(&id, false, Some("Missing places".into()))
        .await
        .unwrap();
    assert_eq!(view.status, DocumentStatus::Reviewed);

    let document = orchestrator.run_analysis(&id).await.unwrap();
    assert_eq!(document.status, DocumentStatus::Completed);
    assert!(document.review.is_none());
}

#[tokio::test]
async fn analysis_survives_reopening_the_database() {
    let ws = Workspace::new();
    let id = ws.register("mario.txt", "Mario lives in Rome.").await;
    let stored = ws
        .orchestrator(mario_client())
        .run_analysis(&id)
        .await
        .unwrap()
        .analysis
        .unwrap();

    let reopened = Arc::new(ws.reopen());
    let view = AnalysisLifecycle::new(reopened).get_analysis(&id).await.unwrap();
    let loaded = view.result().unwrap();

    let stored_keys: HashSet<_> = stored.entity_keys();
    assert_eq!(loaded.entity_keys(), stored_keys);
    assert_eq!(loaded.relations, stored.relations);
}

#[tokio::test]
async fn delete_removes_document_and_upload() {
    let ws = Workspace::new();
    let id = ws.register("mario.txt", "Mario lives in Rome.").await;
    let orchestrator = ws.orchestrator(mario_client());
    orchestrator.run_analysis(&id).await.unwrap();
    let document = ws.store.find(&id).await.unwrap().unwrap();
    assert!(ws.upload_exists(&document));

    let deleted = orchestrator.delete_document(&id).await.unwrap();

    assert_eq!(deleted.id, id);
    assert!(ws.store.find(&id).await.unwrap().is_none());
    assert!(ws.reopen().find(&id).await.unwrap().is_none());
    assert!(!ws.upload_exists(&document));

    let err = orchestrator.delete_document(&id).await.unwrap_err();
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn delete_is_refused_while_submitted() {
    let ws = Workspace::new();
    let id = ws.register("busy.txt", "In flight.").await;
    let lifecycle = AnalysisLifecycle::new(ws.store.clone());
    lifecycle.begin_analysis(&id).await.unwrap();

    let err = lifecycle
        .delete_document(&id, &ws.uploads())
        .await
        .unwrap_err();

    assert!(matches!(err, AnalysisError::Conflict(_)));
    let document = ws.store.find(&id).await.unwrap().unwrap();
    assert_eq!(document.status, DocumentStatus::Submitted);
    assert!(ws.upload_exists(&document));
}
