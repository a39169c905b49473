use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tether::backend::http::HttpBackend;
use tether::backend::{Backend, Credentials};
use tether::connect::Connector;
use tether::connect::detector::PollPolicy;
use tether::connect::state::ConnectionState;
use tether::error::ConnectError;
use tether::identity::Identity;
use tether::provider::ProviderKind;
use tether::window::mock::MockBrowser;

fn identity() -> Identity {
    Identity::new("u1", "o1").unwrap()
}

#[tokio::test]
async fn authorize_posts_identity_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/integrations/hubspot/authorize"))
        .and(body_string_contains("user_id=u1"))
        .and(body_string_contains("org_id=o1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!("https://app.hubspot.com/oauth/authorize?state=abc")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&server.uri()).unwrap();
    let url = backend
        .authorization_url(ProviderKind::Hubspot, &identity())
        .await
        .unwrap();
    assert_eq!(url, "https://app.hubspot.com/oauth/authorize?state=abc");
}

#[tokio::test]
async fn authorize_accepts_plain_text_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/integrations/notion/authorize"))
        .respond_with(ResponseTemplate::new(200).set_body_string("https://api.notion.com/v1/oauth/authorize"))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&server.uri()).unwrap();
    let url = backend
        .authorization_url(ProviderKind::Notion, &identity())
        .await
        .unwrap();
    assert_eq!(url, "https://api.notion.com/v1/oauth/authorize");
}

#[tokio::test]
async fn error_detail_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/integrations/hubspot/authorize"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "detail": "rate limited" })))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&server.uri()).unwrap();
    let err = backend
        .authorization_url(ProviderKind::Hubspot, &identity())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ConnectError::Backend {
            status: 500,
            detail: "rate limited".to_string()
        }
    );
}

#[tokio::test]
async fn error_without_detail_uses_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&server.uri()).unwrap();
    let err = backend
        .authorization_url(ProviderKind::Airtable, &identity())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Connection failed");

    let err = backend
        .credentials(ProviderKind::Airtable, &identity())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Failed to retrieve credentials");
}

#[tokio::test]
async fn credentials_are_kept_opaque() {
    let server = MockServer::start().await;
    let payload = json!({ "access_token": "at", "refresh_token": "rt", "expires_in": 1800 });
    Mock::given(method("POST"))
        .and(path("/integrations/hubspot/credentials"))
        .and(body_string_contains("user_id=u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload.clone()))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&server.uri()).unwrap();
    let credentials = backend
        .credentials(ProviderKind::Hubspot, &identity())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(credentials.as_value(), &payload);
}

#[tokio::test]
async fn empty_credentials_are_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/integrations/hubspot/credentials"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&server.uri()).unwrap();
    assert!(
        backend
            .credentials(ProviderKind::Hubspot, &identity())
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn hubspot_items_use_their_own_route() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/integrations/hubspot/get_hubspot_items"))
        .and(body_string_contains("credentials="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "1", "name": "Acme", "type": "company" },
            { "id": "2", "type": "contact", "parent_id": "1" },
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&server.uri()).unwrap();
    let credentials = Credentials::from_value(json!({ "access_token": "at" })).unwrap();
    let items = backend
        .load_items(ProviderKind::Hubspot, &credentials)
        .await
        .unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name.as_deref(), Some("Acme"));
    assert_eq!(items[1].name, None);
    assert_eq!(items[1].parent_id.as_deref(), Some("1"));
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let backend = HttpBackend::new("http://127.0.0.1:1").unwrap();
    let err = backend
        .authorization_url(ProviderKind::Hubspot, &identity())
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectError::Network(_)));
    assert!(err.to_string().starts_with("Connection failed"));
}

#[tokio::test]
async fn connects_end_to_end_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/integrations/hubspot/authorize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("https://auth.test/hubspot")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/integrations/hubspot/credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "at" })))
        .expect(1)
        .mount(&server)
        .await;

    let browser = Arc::new(MockBrowser::closing_after(2));
    let connector = Connector::new(Arc::new(HttpBackend::new(&server.uri()).unwrap()), browser.clone())
        .with_policy(PollPolicy {
            interval: Duration::from_millis(10),
            timeout: Some(Duration::from_secs(5)),
        });
    let id = identity();

    let session = connector
        .begin_authorization(&id, ProviderKind::Hubspot)
        .await
        .unwrap();
    assert_eq!(browser.opened_urls(), vec!["https://auth.test/hubspot"]);
    session.finished().await;

    assert_eq!(
        connector.state(&id, ProviderKind::Hubspot),
        ConnectionState::Connected(Credentials::from_value(json!({ "access_token": "at" })).unwrap())
    );
}
