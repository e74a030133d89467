/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use serde_json::{Value, json};
use slog::Logger;
use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

use g3librato::LibratoSink;

const AUTHORIZATION: &str = "Basic am9obkBleGFtcGxlLmNvbTphYmM=";

const STATSITE_CHUNK: &[u8] = b"\
counts.active_sessions|1.000000|1401577507
timers.query.sum|1017.000000|1401577507
timers.query.sum_sq|1034289.000000|1401577507
timers.query.mean|1017.000000|1401577507
timers.query.lower|1017.000000|1401577507
timers.query.upper|1017.000000|1401577507
timers.query.count|1|1401577507
timers.query.stdev|0.000000|1401577507
";

fn new_sink(server: &MockServer, extra: &str) -> LibratoSink {
    let content = format!(
        "librato:\n  email: john@example.com\n  token: abc\n  host: web1\n  api: '{}'\n{extra}",
        server.uri()
    );
    let config = g3librato::config::load_str(&content).unwrap();
    let logger = Logger::root(slog::Discard, slog::o!());
    LibratoSink::new(&config, logger).unwrap()
}

async fn request_bodies(server: &MockServer, path: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == path)
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

#[tokio::test]
async fn post_measurements() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/v1/measurements"))
        .and(matchers::header("authorization", AUTHORIZATION))
        .and(matchers::header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let mut sink = new_sink(&server, "  source: localhost\n  tags:\n    env: prod\n");
    sink.build(STATSITE_CHUNK);
    let stats = sink.flush().await;
    assert_eq!(stats.sent_batches, 1);
    assert_eq!(stats.failed_batches, 0);

    let bodies = request_bodies(&server, "/v1/measurements").await;
    assert_eq!(bodies.len(), 1);
    let body = &bodies[0];
    assert_eq!(body["tags"], json!({"env": "prod", "host": "web1"}));
    assert_eq!(
        body["measurements"],
        json!([
            {
                "name": "active_sessions",
                "tags": {"source": "localhost"},
                "time": 1401577507,
                "value": 1.0
            },
            {
                "name": "query",
                "tags": {"source": "localhost"},
                "time": 1401577507,
                "sum": 1017.0,
                "count": 1.0,
                "min": 1017.0,
                "max": 1017.0,
                "stddev_m2": 0.0
            }
        ])
    );
}

#[tokio::test]
async fn post_legacy_gauges() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::header("authorization", AUTHORIZATION))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let mut sink = new_sink(&server, "  source: localhost\n  write_to_legacy: true\n");
    sink.build(STATSITE_CHUNK);
    let stats = sink.flush().await;
    assert_eq!(stats.sent_batches, 2);

    let bodies = request_bodies(&server, "/v1/metrics").await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(
        bodies[0]["gauges"],
        json!([
            {
                "name": "active_sessions",
                "source": "localhost",
                "measure_time": 1401577507,
                "value": 1.0
            },
            {
                "name": "query",
                "source": "localhost",
                "measure_time": 1401577507,
                "sum": 1017.0,
                "count": 1.0,
                "min": 1017.0,
                "max": 1017.0,
                "sum_squares": 1034289.0
            }
        ])
    );
}

#[tokio::test]
async fn failed_batch_does_not_stop_flush() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut sink = new_sink(&server, "  max_metrics_payload: 1\n");
    sink.build(b"gauges.a|1|100\ngauges.b|2|100\ngauges.c|3|100\n");
    let stats = sink.flush().await;
    assert_eq!(stats.failed_batches, 1);
    assert_eq!(stats.sent_batches, 2);

    let bodies = request_bodies(&server, "/v1/measurements").await;
    assert_eq!(bodies.len(), 3);
    assert_eq!(bodies[2]["measurements"][0]["name"], "c");
}

#[tokio::test]
async fn partially_rejected() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "errors": {"params": {"name": ["is not present"]}}
        })))
        .mount(&server)
        .await;

    let mut sink = new_sink(&server, "");
    sink.build(b"gauges.a|1|100\n");
    let stats = sink.flush().await;
    assert_eq!(stats.sent_batches, 1);
    assert_eq!(stats.failed_batches, 0);
}

#[tokio::test]
async fn timeout() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(2)))
        .mount(&server)
        .await;

    let mut sink = new_sink(&server, "  flush_timeout: 100ms\n");
    sink.build(b"gauges.a|1|100\n");
    let stats = sink.flush().await;
    assert_eq!(stats.sent_batches, 0);
    assert_eq!(stats.failed_batches, 1);
}

#[tokio::test]
async fn empty_chunk_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut sink = new_sink(&server, "  write_to_legacy: true\n");
    sink.build(b"\n\ntimers.a.mean|1|100\n");
    let stats = sink.flush().await;
    assert_eq!(stats.sent_batches, 0);
    assert_eq!(stats.failed_batches, 0);
}
