//! HTTP fetcher integration tests
//!
//! Runs `HttpRegistryFetcher` against a local wiremock server to cover header
//! negotiation, status handling, timeouts and body decoding.

use std::time::Duration;
use svcatlas::registry::{HttpRegistryFetcher, RegistryError, RegistryFetcher};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FIXTURE: &str = include_str!("fixtures/registry/eureka_apps.json");

fn fetcher() -> HttpRegistryFetcher {
    HttpRegistryFetcher::with_timeout(Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn test_fetch_sends_accept_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/eureka/apps"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(FIXTURE, "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let doc = fetcher()
        .fetch(&format!("{}/eureka/apps", server.uri()))
        .await
        .unwrap();

    let names: Vec<_> = doc
        .applications()
        .iter()
        .filter_map(|app| app.name.as_deref())
        .collect();
    assert_eq!(names, vec!["BILLING", "INVENTORY", "CUSTOMER"]);
}

#[tokio::test]
async fn test_fetch_non_success_status_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("registry starting"))
        .mount(&server)
        .await;

    let url = format!("{}/eureka/apps", server.uri());
    let err = fetcher().fetch(&url).await.unwrap_err();

    match err {
        RegistryError::Transport {
            url: failed_url,
            message,
        } => {
            assert_eq!(failed_url, url);
            assert!(message.contains("503"));
            assert!(message.contains("registry starting"));
        }
        other => panic!("Expected Transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_invalid_json_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<applications/>"))
        .mount(&server)
        .await;

    let err = fetcher()
        .fetch(&format!("{}/eureka/apps", server.uri()))
        .await
        .unwrap_err();
    assert!(err.is_transport());
    assert!(err.to_string().contains("JSON parse error"));
}

#[tokio::test]
async fn test_fetch_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(FIXTURE, "application/json")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let fetcher = HttpRegistryFetcher::with_timeout(Duration::from_millis(200)).unwrap();
    let err = fetcher
        .fetch(&format!("{}/eureka/apps", server.uri()))
        .await
        .unwrap_err();

    assert!(err.is_transport());
}

#[tokio::test]
async fn test_fetch_empty_registry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"applications":{"application":[]}}"#, "application/json"),
        )
        .mount(&server)
        .await;

    let doc = fetcher()
        .fetch(&format!("{}/eureka/apps", server.uri()))
        .await
        .unwrap();
    assert!(doc.applications().is_empty());
}

#[tokio::test]
async fn test_fetch_wrong_shape_is_malformed_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"applications":{"application":[{"name":42,"instance":[{"hostName":"g"}]}]}}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let err = fetcher()
        .fetch(&format!("{}/eureka/apps", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::MalformedDocument { .. }));
}
