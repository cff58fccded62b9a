use std::net::TcpListener;
use std::sync::Arc;

use httpmock::prelude::*;
use pretty_assertions::assert_eq;
use routeprobe::config::ProbeSettings;
use routeprobe::executor::{
    run_batch, BatchOptions, ReqwestTransport, RequestExecutor, RequestSpec,
};
use routeprobe::route::{HttpMethod, RouteDescriptor};
use routeprobe::session::{TestInput, TestSession};
use routeprobe::{ResponseData, TestOutcome};
use serde_json::json;

fn session_for(base_url: String) -> TestSession {
    let settings = ProbeSettings {
        base_url: Some(base_url),
        ..ProbeSettings::default()
    };
    TestSession::new(
        RequestExecutor::new(Arc::new(ReqwestTransport::new())),
        &settings,
    )
}

#[tokio::test]
async fn single_request_against_live_server() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/users/42");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"ok":true}"#);
        })
        .await;

    let mut session = session_for(server.base_url());
    let route = RouteDescriptor::new(HttpMethod::Get, "/users/:id");
    let outcome = session
        .send(&route, &TestInput::default().with_param("id", "42"))
        .await;

    match outcome {
        TestOutcome::Single { result, context, .. } => {
            assert!(result.success);
            assert_eq!(result.status, 200);
            assert_eq!(result.status_text, "OK");
            assert_eq!(result.data, ResponseData::Json(json!({"ok": true})));
            assert_eq!(result.request_number, 1);
            assert_eq!(context.url, server.url("/users/42"));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn post_sends_json_body_and_headers() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/users")
                .header("content-type", "application/json")
                .header("x-request-id", "abc")
                .json_body(json!({"name": "Ada"}));
            then.status(201)
                .header("content-type", "application/json")
                .body(r#"{"id":1}"#);
        })
        .await;

    let mut session = session_for(server.base_url());
    let route = RouteDescriptor::new(HttpMethod::Post, "/users");
    let input = TestInput::default()
        .with_headers(r#"{"X-Request-Id": "abc"}"#)
        .with_body(r#"{"name": "Ada"}"#);

    let outcome = session.send(&route, &input).await;
    let result = outcome.first_result().expect("a result");
    assert_eq!(result.status, 201);
    assert_eq!(result.data, ResponseData::Json(json!({"id": 1})));

    let context = outcome.context().unwrap();
    assert_eq!(
        context.request_headers.get("Content-Type").map(String::as_str),
        Some("application/json")
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn batch_reports_server_errors_with_payload() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/flaky");
            then.status(503)
                .header("content-type", "text/plain")
                .body("try later");
        })
        .await;

    let mut session = session_for(server.base_url());
    let route = RouteDescriptor::new(HttpMethod::Get, "/flaky");
    let outcome = session
        .send(&route, &TestInput::default().with_count(3))
        .await;

    match outcome {
        TestOutcome::Batch {
            first_result,
            statistics,
            all_results,
            ..
        } => {
            assert_eq!(statistics.total_requests, 3);
            assert_eq!(statistics.successful_requests, 0);
            assert_eq!(statistics.failed_requests, 3);
            assert!(statistics.min_response_time_ms <= statistics.max_response_time_ms);
            assert!(statistics.total_time_ms >= statistics.max_response_time_ms);
            assert_eq!(first_result.status, 503);
            assert_eq!(first_result.data, ResponseData::Text("try later".to_string()));
            let numbers: Vec<_> = all_results.iter().map(|r| r.request_number).collect();
            assert_eq!(numbers, vec![1, 2, 3]);
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    mock.assert_hits_async(3).await;
}

#[tokio::test]
async fn refused_connection_is_a_network_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let executor = RequestExecutor::new(Arc::new(ReqwestTransport::new()));
    let spec = RequestSpec::new(HttpMethod::Get, format!("http://127.0.0.1:{port}/down"));

    let run = run_batch(&executor, &spec, 2, &BatchOptions::default(), |_| {})
        .await
        .unwrap();

    assert_eq!(run.results.len(), 2);
    for result in &run.results {
        assert!(!result.success);
        assert!(result.error);
        assert_eq!(result.status, 0);
        assert_eq!(result.status_text, "Network Error");
        let message = result.data.as_text().unwrap();
        assert!(!message.is_empty());
    }
}

#[tokio::test]
async fn outcome_serialises_for_the_renderer() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/items/7");
            then.status(204);
        })
        .await;

    let mut session = session_for(server.base_url());
    let route = RouteDescriptor::new(HttpMethod::Delete, "/items/:itemId");
    let outcome = session
        .send(&route, &TestInput::default().with_param("itemId", "7"))
        .await;

    let value = serde_json::to_value(outcome).unwrap();
    assert_eq!(value["kind"], json!("single"));
    assert_eq!(value["result"]["status"], json!(204));
    assert_eq!(value["result"]["success"], json!(true));
    assert_eq!(value["result"]["data"], json!(""));
    assert_eq!(value["context"]["method"], json!("DELETE"));
    assert!(value["result"].get("error").is_none());
}
