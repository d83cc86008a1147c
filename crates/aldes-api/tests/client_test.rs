#![allow(clippy::unwrap_used)]
// Integration tests for `AldesClient` using wiremock.

use pretty_assertions::assert_eq;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use aldes_api::{AldesClient, Error, Temperature, ThermostatId, ThermostatUpdate};

// ── Helpers ─────────────────────────────────────────────────────────

const PRODUCTS: &str = "/aldesoc/v5/users/me/products";
const MODEM: &str = "34EAE7964DD6";

async fn setup() -> (MockServer, AldesClient) {
    let server = MockServer::start().await;
    let client = AldesClient::with_client(
        reqwest::Client::new(),
        Url::parse(&server.uri()).unwrap(),
        "user".into(),
        SecretString::from("secret".to_string()),
    )
    .unwrap();
    (server, client)
}

fn token(access_token: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "scope": "offline_access",
        "token_type": "Bearer",
        "access_token": access_token,
        "expires_in": 2_592_000,
        "refresh_token": "refresh"
    }))
}

/// Token endpoint that hands out `stale` first, then `fresh`.
async fn mount_rotating_tokens(server: &MockServer, expected_logins: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth2/token/"))
        .respond_with(token("stale"))
        .up_to_n_times(1)
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token/"))
        .respond_with(token("fresh"))
        .expect(expected_logins - 1)
        .mount(server)
        .await;
}

fn products_body(mode: &str) -> serde_json::Value {
    json!([{
        "modem": MODEM,
        "reference": "TONE_AIR",
        "serial_number": "SN-1",
        "indicator": {
            "current_air_mode": mode,
            "thermostats": [
                { "ThermostatId": 18992, "Name": "Salon", "TemperatureSet": 21, "CurrentTemperature": 20.5 }
            ]
        }
    }])
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn test_authenticate_sends_password_grant() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token/"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("grant_type=password&username=user&password=secret"))
        .respond_with(token("abc"))
        .expect(1)
        .mount(&server)
        .await;

    let credential = client.authenticate().await.unwrap();

    assert_eq!(credential.token_type, "Bearer");
    assert_eq!(credential.access_token.expose_secret(), "abc");
    assert_eq!(credential.scope.as_deref(), Some("offline_access"));
    assert!(credential.expires_at().is_some());
    assert!(client.credentials().is_authenticated());
}

#[tokio::test]
async fn test_authenticate_failure_reports_status() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token/"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
        .mount(&server)
        .await;

    let result = client.authenticate().await;

    match result {
        Err(Error::Authentication { status, ref message }) => {
            assert_eq!(status, Some(400));
            assert!(message.contains("invalid_grant"), "message: {message}");
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
    assert!(!client.credentials().is_authenticated());
}

#[tokio::test]
async fn test_failed_login_keeps_previous_credential() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token/"))
        .respond_with(token("first"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    client.authenticate().await.unwrap();
    assert!(client.authenticate().await.is_err());

    let current = client.credentials().current().unwrap();
    assert_eq!(current.access_token.expose_secret(), "first");
}

// ── Reads ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_products_logs_in_lazily() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token/"))
        .respond_with(token("abc"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(PRODUCTS))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(products_body("B")))
        .expect(2)
        .mount(&server)
        .await;

    let products = client.fetch_products().await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].modem, MODEM);
    assert_eq!(products[0].air_mode(), Some("B"));
    assert_eq!(
        products[0].thermostats()[0].temperature_set,
        Some(Temperature::from_degrees(21))
    );

    // Second call reuses the stored token.
    client.fetch_products().await.unwrap();
}

#[tokio::test]
async fn test_fetch_products_reauthenticates_once_on_401() {
    let (server, client) = setup().await;
    mount_rotating_tokens(&server, 2).await;

    Mock::given(method("GET"))
        .and(path(PRODUCTS))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PRODUCTS))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(products_body("C")))
        .expect(1)
        .mount(&server)
        .await;

    let products = client.fetch_products().await.unwrap();
    assert_eq!(products[0].air_mode(), Some("C"));
}

#[tokio::test]
async fn test_fetch_products_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token/"))
        .respond_with(token("abc"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PRODUCTS))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let result = client.fetch_products().await;
    match result {
        Err(Error::Api { status, ref message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_products_bad_payload() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token/"))
        .respond_with(token("abc"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PRODUCTS))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let result = client.fetch_products().await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

// ── Writes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_update_thermostats_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token/"))
        .respond_with(token("abc"))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("{PRODUCTS}/{MODEM}/updateThermostats")))
        .and(header("authorization", "Bearer abc"))
        .and(body_json(json!([{ "ThermostatId": 18992, "TemperatureSet": 25 }])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let update = ThermostatUpdate::new(ThermostatId(18992), Temperature::from_degrees(25));
    client.update_thermostats(MODEM, &update).await.unwrap();
}

#[tokio::test]
async fn test_update_thermostats_resends_same_body_after_401() {
    let (server, client) = setup().await;
    mount_rotating_tokens(&server, 2).await;

    let expected = json!([{ "ThermostatId": 18992, "TemperatureSet": 25 }]);
    Mock::given(method("PATCH"))
        .and(path(format!("{PRODUCTS}/{MODEM}/updateThermostats")))
        .and(header("authorization", "Bearer stale"))
        .and(body_json(&expected))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("{PRODUCTS}/{MODEM}/updateThermostats")))
        .and(header("authorization", "Bearer fresh"))
        .and(body_json(&expected))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let update = ThermostatUpdate::new(ThermostatId(18992), Temperature::from_degrees(25));
    client.update_thermostats(MODEM, &update).await.unwrap();
}

#[tokio::test]
async fn test_change_mode_second_401_does_not_loop() {
    let (server, client) = setup().await;
    mount_rotating_tokens(&server, 2).await;

    Mock::given(method("POST"))
        .and(path(format!("{PRODUCTS}/{MODEM}/commands")))
        .and(body_json(json!({ "method": "changeMode", "params": ["A"] })))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let result = client.change_mode(MODEM, "A").await;
    assert!(
        matches!(result, Err(Error::Unauthorized)),
        "expected Unauthorized, got: {result:?}"
    );
}

#[tokio::test]
async fn test_change_mode_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token/"))
        .respond_with(token("abc"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{PRODUCTS}/{MODEM}/commands")))
        .respond_with(ResponseTemplate::new(422).set_body_string("unknown mode"))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.change_mode(MODEM, "Z").await;
    match result {
        Err(Error::Api { status, .. }) => assert_eq!(status, 422),
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_host_is_auth_failure() {
    let (server, client) = setup().await;
    drop(server);

    let result = client.fetch_products().await;
    match result {
        Err(Error::Authentication { status: None, .. }) => {}
        other => panic!("expected unreachable Authentication error, got: {other:?}"),
    }
}
