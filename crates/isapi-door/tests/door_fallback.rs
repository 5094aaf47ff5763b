//! Door actuator fallback tests against a mock ISAPI device.

use std::time::Duration;

use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use isapi_door::door::{open_door, open_door_with, AttemptOutcome, Stage};
use isapi_door::{ClientConfig, ConnectionTarget, Credentials, IsapiClient, Scheme};

// ─────────────────────── helpers ───────────────────────

const PRIMARY: &str = "/ISAPI/AccessControl/door/1/open";
const ALT_A: &str = "/ISAPI/AccessControl/door/open";
const ALT_B: &str = "/ISAPI/AccessControl/RemoteControl/door";
const PRIMARY_MARKER: &str = "<doorID>1</doorID>";
const ALT_MARKER: &str = "<cmd>open</cmd>";

fn client_for(server: &MockServer, config: &ClientConfig) -> IsapiClient {
    let addr = server.address();
    let target = ConnectionTarget::new(addr.ip().to_string(), addr.port(), Scheme::Http);
    IsapiClient::new(target, Credentials::new("admin", "12345"), config).unwrap()
}

async fn reply(server: &MockServer, p: &str, marker: &str, status: u16, body: &str) {
    Mock::given(method("POST"))
        .and(path(p))
        .and(body_string_contains(marker))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

/// (path, used alternative payload) for each request the server saw.
async fn seen(server: &MockServer) -> Vec<(String, bool)> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| {
            let body = String::from_utf8_lossy(&r.body);
            (r.url.path().to_string(), body.contains(ALT_MARKER))
        })
        .collect()
}

// ─────────────────────── tests ───────────────────────

#[tokio::test]
async fn test_primary_success_short_circuits() {
    let server = MockServer::start().await;
    reply(&server, PRIMARY, PRIMARY_MARKER, 200, "<ResponseStatus/>").await;

    let outcome = open_door(&client_for(&server, &ClientConfig::default()), 1).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.attempts.len(), 1);
    assert_eq!(outcome.success().unwrap().attempt.stage, Stage::Primary);
    assert_eq!(
        outcome.summary(),
        "Door 1 opened successfully using primary endpoint!"
    );
    assert_eq!(seen(&server).await, vec![(PRIMARY.to_string(), false)]);
}

#[tokio::test]
async fn test_alternative_xml_format_scenario() {
    let server = MockServer::start().await;
    reply(&server, PRIMARY, PRIMARY_MARKER, 403, "forbidden").await;
    reply(&server, ALT_A, PRIMARY_MARKER, 404, "not found").await;
    reply(&server, ALT_B, PRIMARY_MARKER, 404, "not found").await;
    reply(&server, PRIMARY, ALT_MARKER, 200, "ok").await;

    let outcome = open_door(&client_for(&server, &ClientConfig::default()), 1).await;

    assert!(outcome.is_success());
    assert_eq!(
        outcome.success().unwrap().attempt.stage,
        Stage::AlternativePayload
    );
    assert_eq!(
        outcome.summary(),
        "Door 1 opened successfully using alternative XML format!"
    );
    assert_eq!(
        seen(&server).await,
        vec![
            (PRIMARY.to_string(), false),
            (ALT_A.to_string(), false),
            (ALT_B.to_string(), false),
            (PRIMARY.to_string(), true),
        ]
    );
}

#[tokio::test]
async fn test_second_alternative_endpoint_wins() {
    let server = MockServer::start().await;
    reply(&server, ALT_B, PRIMARY_MARKER, 200, "ok").await;

    let outcome = open_door(&client_for(&server, &ClientConfig::default()), 1).await;

    let success = outcome.success().unwrap();
    assert_eq!(success.attempt.stage, Stage::AlternativeEndpoint);
    assert_eq!(success.attempt.path, ALT_B);
    assert_eq!(outcome.attempts.len(), 3);
    assert!(outcome.summary().contains("using alternative endpoint: http://"));
}

#[tokio::test]
async fn test_all_candidates_fail_in_order_and_echo_last_body() {
    let server = MockServer::start().await;
    reply(&server, PRIMARY, PRIMARY_MARKER, 403, "p1").await;
    reply(&server, ALT_A, PRIMARY_MARKER, 404, "a1").await;
    reply(&server, ALT_B, PRIMARY_MARKER, 404, "b1").await;
    reply(&server, PRIMARY, ALT_MARKER, 400, "p2").await;
    reply(&server, ALT_A, ALT_MARKER, 500, "a2").await;
    reply(&server, ALT_B, ALT_MARKER, 401, "last body").await;

    let outcome = open_door(&client_for(&server, &ClientConfig::default()), 1).await;

    assert!(!outcome.is_success());
    assert_eq!(outcome.attempts.len(), 6);
    assert_eq!(outcome.last_response_body(), Some("last body"));
    assert_eq!(outcome.summary(), "All attempts to open door 1 failed.");
    assert_eq!(
        seen(&server).await,
        vec![
            (PRIMARY.to_string(), false),
            (ALT_A.to_string(), false),
            (ALT_B.to_string(), false),
            (PRIMARY.to_string(), true),
            (ALT_A.to_string(), true),
            (ALT_B.to_string(), true),
        ]
    );
}

#[tokio::test]
async fn test_only_200_counts_as_success() {
    let server = MockServer::start().await;
    reply(&server, PRIMARY, PRIMARY_MARKER, 204, "").await;
    reply(&server, ALT_A, PRIMARY_MARKER, 201, "").await;

    let outcome = open_door(&client_for(&server, &ClientConfig::default()), 1).await;

    assert!(!outcome.is_success());
    assert_eq!(outcome.attempts.len(), 6);
    assert_eq!(
        outcome.attempts[0].outcome,
        AttemptOutcome::Response {
            status: 204,
            body: String::new()
        }
    );
}

#[tokio::test]
async fn test_transport_error_does_not_stop_the_sequence() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PRIMARY))
        .and(body_string_contains(PRIMARY_MARKER))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;
    reply(&server, ALT_A, PRIMARY_MARKER, 200, "ok").await;

    let config = ClientConfig::resolve(Some(1), false);
    let outcome = open_door(&client_for(&server, &config), 1).await;

    match &outcome.attempts[0].outcome {
        AttemptOutcome::TransportError { message } => {
            assert!(message.contains("timed out"), "{message}");
        }
        other => panic!("expected a transport error, got {other:?}"),
    }
    assert!(outcome.is_success());
    assert_eq!(outcome.success().unwrap().attempt.path, ALT_A);
}

#[tokio::test]
async fn test_unreachable_device_reports_no_response() {
    // Bind then drop to get a port nothing listens on.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let target = ConnectionTarget::new("127.0.0.1", port, Scheme::Http);
    let client = IsapiClient::new(
        target,
        Credentials::new("admin", "12345"),
        &ClientConfig::resolve(Some(2), false),
    )
    .unwrap();

    let outcome = open_door(&client, 1).await;

    assert!(!outcome.is_success());
    assert_eq!(outcome.attempts.len(), 6);
    assert!(outcome
        .attempts
        .iter()
        .all(|a| matches!(a.outcome, AttemptOutcome::TransportError { .. })));
    assert_eq!(outcome.last_response_body(), None);
    match &outcome.attempts[5].outcome {
        AttemptOutcome::TransportError { message } => {
            assert!(message.to_lowercase().contains("refused"), "{message}");
        }
        other => panic!("expected a transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_attempts_are_reported_as_they_finish() {
    let server = MockServer::start().await;
    reply(&server, PRIMARY, PRIMARY_MARKER, 403, "p1").await;
    reply(&server, ALT_A, PRIMARY_MARKER, 404, "a1").await;
    reply(&server, ALT_B, PRIMARY_MARKER, 200, "ok").await;

    let client = client_for(&server, &ClientConfig::default());
    let mut reported = Vec::new();
    let outcome = open_door_with(&client, 1, |record| {
        reported.push((record.attempt.path.clone(), record.outcome.clone()));
    })
    .await;

    assert!(outcome.is_success());
    let expected: Vec<_> = outcome
        .attempts
        .iter()
        .map(|a| (a.attempt.path.clone(), a.outcome.clone()))
        .collect();
    assert_eq!(reported, expected);
    assert_eq!(
        reported.iter().map(|(p, _)| p.as_str()).collect::<Vec<_>>(),
        vec![PRIMARY, ALT_A, ALT_B]
    );
    let port = server.address().port();
    assert_eq!(
        outcome.attempts[0].url,
        format!("http://127.0.0.1:{port}{PRIMARY}")
    );
}
