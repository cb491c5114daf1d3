//! Integration tests for the export worker with network scenarios
//!
//! Covers the path completion event → queue → worker → HTTP → SQLite record →
//! published event, against a WireMock endpoint and a real SQLite file.

#![allow(dead_code)]

#[path = "support.rs"]
mod support;

use std::net::TcpListener;
use std::time::Duration;

use course_export_core::TaskQueue;
use course_export_domain::{CompletionEvent, TaskStatus, WorkerConfig};
use serde_json::json;
use support::Pipeline;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PREFIX: &str = "There was an error communicating with the remote server. It may be down: ";

fn worker_config() -> WorkerConfig {
    WorkerConfig { poll_interval_ms: 20, batch_size: 10, concurrency: 4, join_timeout_ms: 2_000 }
}

fn completion(user: i64, object: i64) -> CompletionEvent {
    CompletionEvent { related_user_id: user, course_id: 7, object_id: object }
}

#[tokio::test]
async fn successful_export_is_recorded_and_announced() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/completion"))
        .and(header("authorization", "Bearer token-123"))
        .and(body_json(json!({"courseid": 7, "userid": "EXT42", "status": "completed"})))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = Pipeline::new(format!("{}/completion", server.uri()), worker_config());
    let mut subscriber = pipeline.events.subscribe();

    let handle = pipeline.scheduler.schedule(&completion(42, 99)).await.unwrap();
    let summary = pipeline.worker.drain().await.unwrap();

    assert_eq!(summary.succeeded, 1);
    let task = pipeline.queue.get(handle.id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Succeeded);

    let records = pipeline.records.list_for_user(42).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].completion_id, 99);

    let event = subscriber.recv().await.unwrap();
    assert_eq!(event.object_id, records[0].id);
    assert_eq!(event.related_user_id, 42);
    assert_eq!(event.course_id(), 7);
}

#[tokio::test]
async fn user_without_idnumber_is_sent_as_null() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(body_json(json!({"courseid": 7, "userid": null, "status": "completed"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = Pipeline::new(server.uri(), worker_config());

    pipeline.scheduler.schedule(&completion(43, 5)).await.unwrap();
    let summary = pipeline.worker.drain().await.unwrap();

    assert_eq!(summary.succeeded, 1);
    assert_eq!(pipeline.db.record_count(), 1);
}

#[tokio::test]
async fn rejected_export_fails_task_without_record() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad course"))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = Pipeline::new(server.uri(), worker_config());
    let mut subscriber = pipeline.events.subscribe();

    let handle = pipeline.scheduler.schedule(&completion(42, 99)).await.unwrap();
    let summary = pipeline.worker.drain().await.unwrap();

    assert_eq!(summary.failed, 1);
    let task = pipeline.queue.get(handle.id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(
        task.last_error.as_deref(),
        Some("Error 400: There following error occured during transfer of data: bad course")
    );
    assert_eq!(pipeline.db.record_count(), 0);
    assert!(subscriber.try_recv().is_err());
}

#[tokio::test]
async fn server_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = Pipeline::new(server.uri(), worker_config());

    pipeline.scheduler.schedule(&completion(42, 99)).await.unwrap();
    pipeline.worker.drain().await.unwrap();
    pipeline.worker.drain().await.unwrap();

    assert_eq!(server.received_requests().await.unwrap().len(), 1);
    assert_eq!(pipeline.db.record_count(), 0);
}

#[tokio::test]
async fn unreachable_endpoint_fails_with_transport_prefix() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener); // release the port so that requests fail with ECONNREFUSED

    let pipeline = Pipeline::new(format!("http://{addr}/completion"), worker_config());

    let handle = pipeline.scheduler.schedule(&completion(42, 99)).await.unwrap();
    pipeline.worker.drain().await.unwrap();

    let task = pipeline.queue.get(handle.id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert!(task.last_error.as_deref().unwrap().starts_with(PREFIX));
    assert_eq!(pipeline.db.record_count(), 0);
}

#[tokio::test]
async fn mixed_batch_records_only_successes() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(body_json(json!({"courseid": 7, "userid": "EXT42", "status": "completed"})))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(body_json(json!({"courseid": 7, "userid": null, "status": "completed"})))
        .respond_with(ResponseTemplate::new(404).set_body_string("unknown user"))
        .mount(&server)
        .await;

    let pipeline = Pipeline::new(server.uri(), worker_config());

    for object in 1..=3 {
        pipeline.scheduler.schedule(&completion(42, object)).await.unwrap();
    }
    pipeline.scheduler.schedule(&completion(43, 10)).await.unwrap();
    let summary = pipeline.worker.drain().await.unwrap();

    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.failed, 1);
    assert_eq!(pipeline.db.record_count(), 3);
    assert!(pipeline.records.list_for_user(43).await.unwrap().is_empty());
}

#[tokio::test]
async fn background_worker_processes_scheduled_events() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let mut pipeline = Pipeline::new(server.uri(), worker_config());
    pipeline.worker.start().unwrap();

    pipeline.scheduler.schedule(&completion(42, 1)).await.unwrap();
    pipeline.scheduler.schedule(&completion(42, 2)).await.unwrap();

    for _ in 0..100 {
        if pipeline.db.record_count() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    pipeline.worker.stop().await.unwrap();

    assert_eq!(pipeline.db.record_count(), 2);
    assert_eq!(pipeline.queue.pending_count().await.unwrap(), 0);
}
