// Integration tests: real HTTP token exchange against a local token endpoint
use std::collections::HashMap;
use std::time::Duration;

use actix_web::cookie::Cookie;
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App, HttpResponse, HttpServer};
use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};
use studyhub_auth::oauth::{ExchangeError, HttpTokenExchange, TokenExchange, TokenRequest};
use studyhub_auth::session::{OAUTH_STATE_COOKIE, SESSION_COOKIE};
use studyhub_auth::settings::{AuthSettings, ProviderSettings};
use studyhub_auth::{configure_services, AuthError, OAuthProvider, SessionManager};

const CLIENT_ID: &str = "integration-client-id";
const CLIENT_SECRET: &str = "integration-client-secret";

fn id_token(claims: &Value) -> String {
    let header = general_purpose::URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = general_purpose::URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}

fn field<'a>(form: &'a HashMap<String, String>, name: &str) -> &'a str {
    form.get(name).map(String::as_str).unwrap_or_default()
}

/// Minimal stand-in for Google's token endpoint
async fn token_endpoint(form: web::Form<HashMap<String, String>>) -> HttpResponse {
    let form = form.into_inner();
    if field(&form, "grant_type") != "authorization_code"
        || field(&form, "client_id") != CLIENT_ID
        || field(&form, "client_secret") != CLIENT_SECRET
    {
        return HttpResponse::Unauthorized().json(json!({ "error": "invalid_client" }));
    }

    match field(&form, "code") {
        "abc123" => HttpResponse::Ok().json(json!({
            "access_token": "ya29.test",
            "expires_in": 3599,
            "token_type": "Bearer",
            "scope": "openid profile email",
            "id_token": id_token(&json!({ "sub": "u1", "name": "Ada", "aud": CLIENT_ID })),
        })),
        "not-json" => HttpResponse::Ok().body("<html>oops</html>"),
        _ => HttpResponse::BadRequest().json(json!({
            "error": "invalid_grant",
            "error_description": "Bad Request"
        })),
    }
}

async fn spawn_token_endpoint() -> String {
    let server = HttpServer::new(|| App::new().route("/token", web::post().to(token_endpoint)))
        .workers(1)
        .bind(("127.0.0.1", 0))
        .expect("bind local token endpoint");
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    format!("http://{addr}/token")
}

fn token_request(code: &str) -> TokenRequest {
    TokenRequest {
        code: code.to_string(),
        client_id: CLIENT_ID.to_string(),
        client_secret: CLIENT_SECRET.to_string(),
        redirect_uri: "http://localhost:4000/auth/google/callback".to_string(),
        grant_type: "authorization_code".to_string(),
    }
}

fn provider_settings(token_endpoint: String) -> ProviderSettings {
    ProviderSettings {
        token_endpoint,
        client_id: Some(CLIENT_ID.to_string()),
        client_secret: Some(CLIENT_SECRET.to_string()),
        client_id_env: None,
        client_secret_env: None,
        exchange_timeout_secs: 5,
        ..Default::default()
    }
}

#[actix_web::test]
async fn test_successful_exchange_returns_id_token() {
    let endpoint = spawn_token_endpoint().await;
    let exchange = HttpTokenExchange::new(Duration::from_secs(5)).unwrap();

    let response = exchange
        .exchange(&endpoint, &token_request("abc123"))
        .await
        .unwrap();
    assert_eq!(response.token_type.as_deref(), Some("Bearer"));
    assert_eq!(response.expires_in, Some(3599));
    assert!(response.id_token.is_some());
    assert!(response.refresh_token.is_none());
}

#[actix_web::test]
async fn test_rejected_exchange_keeps_status_and_body() {
    let endpoint = spawn_token_endpoint().await;
    let exchange = HttpTokenExchange::new(Duration::from_secs(5)).unwrap();

    let err = exchange
        .exchange(&endpoint, &token_request("already-used"))
        .await
        .unwrap_err();
    match err {
        ExchangeError::Rejected { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("invalid_grant"));
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[actix_web::test]
async fn test_wrong_client_secret_is_rejected() {
    let endpoint = spawn_token_endpoint().await;
    let exchange = HttpTokenExchange::new(Duration::from_secs(5)).unwrap();

    let mut request = token_request("abc123");
    request.client_secret = "wrong".to_string();
    let err = exchange.exchange(&endpoint, &request).await.unwrap_err();
    assert!(matches!(err, ExchangeError::Rejected { status: 401, .. }));
}

#[actix_web::test]
async fn test_non_json_success_body() {
    let endpoint = spawn_token_endpoint().await;
    let exchange = HttpTokenExchange::new(Duration::from_secs(5)).unwrap();

    let err = exchange
        .exchange(&endpoint, &token_request("not-json"))
        .await
        .unwrap_err();
    assert!(matches!(err, ExchangeError::InvalidResponse(_)));
}

#[actix_web::test]
async fn test_unreachable_endpoint_is_transport_error() {
    let exchange = HttpTokenExchange::new(Duration::from_secs(2)).unwrap();
    let err = exchange
        .exchange("http://127.0.0.1:9/token", &token_request("abc123"))
        .await
        .unwrap_err();
    assert!(matches!(err, ExchangeError::Transport(_)));
}

#[actix_web::test]
async fn test_provider_maps_failures_to_token_exchange_error() {
    let endpoint = spawn_token_endpoint().await;
    let provider = OAuthProvider::from_settings(provider_settings(endpoint)).unwrap();

    let result = provider
        .exchange_code("already-used", "http://localhost:4000/auth/google/callback")
        .await;
    assert!(matches!(result, Err(AuthError::TokenExchange(_))));
}

#[actix_web::test]
async fn test_sign_in_flow_over_http() {
    let endpoint = spawn_token_endpoint().await;
    let mut settings = AuthSettings::default();
    settings.provider = provider_settings(endpoint);
    settings.session.app_secret = "integration-app-secret-with-enough-length".to_string();
    settings.cookies.secure = false;

    let provider = OAuthProvider::from_settings(settings.provider.clone()).unwrap();
    let session_manager = SessionManager::from_settings(&settings);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(provider))
            .app_data(web::Data::new(session_manager))
            .app_data(web::Data::new(settings))
            .configure(configure_services),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/auth/google")
        .insert_header((header::HOST, "localhost:4000"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let state_cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == OAUTH_STATE_COOKIE)
        .map(Cookie::into_owned)
        .unwrap();
    let location = resp
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let state = url::Url::parse(&location)
        .unwrap()
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap();

    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("code", "abc123")
        .append_pair("state", &state)
        .finish();
    let req = test::TestRequest::get()
        .uri(&format!("/auth/google/callback?{query}"))
        .insert_header((header::HOST, "localhost:4000"))
        .cookie(Cookie::new(OAUTH_STATE_COOKIE, state_cookie.value().to_string()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let session = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .map(Cookie::into_owned)
        .unwrap();

    let req = test::TestRequest::get()
        .uri("/api/me")
        .cookie(Cookie::new(SESSION_COOKIE, session.value().to_string()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["user"]["sub"], "u1");
    assert_eq!(body["user"]["name"], "Ada");
}
