use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

use serde_json::json;
use tempfile::{TempDir, tempdir};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, method, path},
};
use ytplcli::{
    config::DEFAULT_SCOPE,
    management::{Authorizer, CredentialManager, parse_client_secrets},
    types::{ClientSecrets, Token},
    utils::now_timestamp,
    youtube::auth::{AuthError, consent_url},
};

/// Hands out a fixed token and counts how often consent was requested.
#[derive(Default)]
struct FakeAuthorizer {
    calls: AtomicUsize,
}

impl Authorizer for FakeAuthorizer {
    async fn authorize(&self, _secrets: &ClientSecrets, scope: &str) -> Result<Token, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Token {
            access_token: "consented".to_string(),
            refresh_token: Some("consented-refresh".to_string()),
            scope: scope.to_string(),
            expires_in: 3600,
            obtained_at: now_timestamp(),
        })
    }
}

struct Fixture {
    dir: TempDir,
    manager: CredentialManager<FakeAuthorizer>,
}

impl Fixture {
    fn new(token_uri: Option<String>) -> Self {
        let dir = tempdir().unwrap();
        let secrets_path = dir.path().join("client_secrets.json");
        if let Some(token_uri) = token_uri {
            let secrets = json!({
                "installed": {
                    "client_id": "client-123",
                    "client_secret": "shh",
                    "token_uri": token_uri
                }
            });
            std::fs::write(&secrets_path, secrets.to_string()).unwrap();
        }

        let manager = CredentialManager::new(
            dir.path().join("cache/token.json"),
            secrets_path,
            DEFAULT_SCOPE.to_string(),
            FakeAuthorizer::default(),
        );

        Self { dir, manager }
    }

    fn token_path(&self) -> PathBuf {
        self.dir.path().join("cache/token.json")
    }

    fn store(&self, token: &Token) {
        let path = self.token_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, serde_json::to_string(token).unwrap()).unwrap();
    }

    fn stored(&self) -> Token {
        read_token(&self.token_path())
    }

    fn manager_calls(&self) -> usize {
        self.manager.authorizer().calls.load(Ordering::SeqCst)
    }
}

fn read_token(path: &Path) -> Token {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn token(access: &str, obtained_at: u64, scope: &str) -> Token {
    Token {
        access_token: access.to_string(),
        refresh_token: Some("refresh-1".to_string()),
        scope: scope.to_string(),
        expires_in: 3600,
        obtained_at,
    }
}

async fn token_endpoint(status: u16) -> MockServer {
    let server = MockServer::start().await;
    let response = if status == 200 {
        ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "refreshed",
            "expires_in": 3599,
            "token_type": "Bearer"
        }))
    } else {
        ResponseTemplate::new(status).set_body_json(json!({ "error": "invalid_grant" }))
    };
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .and(body_string_contains("client_secret=shh"))
        .respond_with(response)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_valid_token_is_returned_unchanged() {
    // No secrets file: a usable token must not need one.
    let fixture = Fixture::new(None);
    let stored = token("cached", now_timestamp(), DEFAULT_SCOPE);
    fixture.store(&stored);

    let obtained = fixture.manager.obtain().await.unwrap();

    assert_eq!(obtained, stored);
}

#[tokio::test]
async fn test_expired_token_is_refreshed_and_persisted() {
    let server = token_endpoint(200).await;
    let fixture = Fixture::new(Some(format!("{}/token", server.uri())));
    fixture.store(&token("stale", 0, DEFAULT_SCOPE));

    let obtained = fixture.manager.obtain().await.unwrap();

    assert_eq!(obtained.access_token, "refreshed");
    assert_eq!(obtained.refresh_token.as_deref(), Some("refresh-1"));
    assert_eq!(obtained.scope, DEFAULT_SCOPE);
    assert_eq!(fixture.stored(), obtained);
}

#[tokio::test]
async fn test_token_inside_expiry_margin_counts_as_expired() {
    let server = token_endpoint(200).await;
    let fixture = Fixture::new(Some(format!("{}/token", server.uri())));
    // Nominally valid for another 100 seconds.
    fixture.store(&token("almost", now_timestamp() - 3500, DEFAULT_SCOPE));

    let obtained = fixture.manager.obtain().await.unwrap();

    assert_eq!(obtained.access_token, "refreshed");
}

#[tokio::test]
async fn test_failed_refresh_falls_back_to_consent() {
    let server = token_endpoint(400).await;
    let fixture = Fixture::new(Some(format!("{}/token", server.uri())));
    fixture.store(&token("stale", 0, DEFAULT_SCOPE));

    let obtained = fixture.manager.obtain().await.unwrap();

    assert_eq!(obtained.access_token, "consented");
    assert_eq!(fixture.manager_calls(), 1);
    assert_eq!(fixture.stored().access_token, "consented");
}

#[tokio::test]
async fn test_missing_token_requires_consent() {
    let fixture = Fixture::new(Some("http://127.0.0.1:9/token".to_string()));

    let obtained = fixture.manager.obtain().await.unwrap();

    assert_eq!(obtained.access_token, "consented");
    assert_eq!(fixture.manager_calls(), 1);
    assert_eq!(fixture.stored(), obtained);
}

#[tokio::test]
async fn test_token_with_narrower_scope_is_not_refreshed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let fixture = Fixture::new(Some(format!("{}/token", server.uri())));
    fixture.store(&token(
        "readonly",
        now_timestamp(),
        "https://www.googleapis.com/auth/youtube.readonly",
    ));

    let obtained = fixture.manager.obtain().await.unwrap();

    assert_eq!(obtained.access_token, "consented");
    assert_eq!(fixture.manager_calls(), 1);
}

#[tokio::test]
async fn test_corrupt_token_file_requires_consent() {
    let fixture = Fixture::new(Some("http://127.0.0.1:9/token".to_string()));
    let path = fixture.token_path();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "{ not json").unwrap();

    let obtained = fixture.manager.obtain().await.unwrap();

    assert_eq!(obtained.access_token, "consented");
}

#[tokio::test]
async fn test_missing_secrets_file_is_an_error() {
    let fixture = Fixture::new(None);

    assert!(matches!(
        fixture.manager.obtain().await,
        Err(AuthError::ClientSecretsRead { .. })
    ));
    assert_eq!(fixture.manager_calls(), 0);
}

#[tokio::test]
async fn test_discard_removes_stored_token() {
    let fixture = Fixture::new(None);
    fixture.store(&token("cached", now_timestamp(), DEFAULT_SCOPE));

    fixture.manager.discard().await.unwrap();
    assert!(!fixture.token_path().exists());

    // Discarding twice is fine.
    fixture.manager.discard().await.unwrap();
}

#[tokio::test]
async fn test_reauthorize_ignores_valid_token() {
    let fixture = Fixture::new(Some("http://127.0.0.1:9/token".to_string()));
    fixture.store(&token("cached", now_timestamp(), DEFAULT_SCOPE));

    let obtained = fixture.manager.reauthorize().await.unwrap();

    assert_eq!(obtained.access_token, "consented");
    assert_eq!(fixture.manager_calls(), 1);
}

#[test]
fn test_parse_client_secrets_prefers_installed() {
    let secrets = parse_client_secrets(
        r#"{
            "installed": { "client_id": "desktop", "client_secret": "a" },
            "web": { "client_id": "web", "client_secret": "b" }
        }"#,
    )
    .unwrap();

    assert_eq!(secrets.client_id, "desktop");
    assert_eq!(secrets.token_uri, "https://oauth2.googleapis.com/token");
}

#[test]
fn test_parse_client_secrets_accepts_web() {
    let secrets = parse_client_secrets(r#"{ "web": { "client_id": "web" } }"#).unwrap();

    assert_eq!(secrets.client_id, "web");
    assert_eq!(secrets.client_secret, None);
}

#[test]
fn test_parse_client_secrets_rejects_other_layouts() {
    assert!(parse_client_secrets(r#"{ "client_id": "flat" }"#).is_err());
    assert!(parse_client_secrets("not json").is_err());
}

#[test]
fn test_consent_url_carries_pkce_parameters() {
    let secrets = parse_client_secrets(r#"{ "installed": { "client_id": "client-123" } }"#).unwrap();

    let url = consent_url(
        &secrets,
        "http://127.0.0.1:8080/callback",
        DEFAULT_SCOPE,
        "challenge",
    )
    .unwrap();
    let params: HashMap<String, String> = url.query_pairs().into_owned().collect();

    assert!(url.as_str().starts_with("https://accounts.google.com/o/oauth2/auth?"));
    assert_eq!(params["client_id"], "client-123");
    assert_eq!(params["redirect_uri"], "http://127.0.0.1:8080/callback");
    assert_eq!(params["response_type"], "code");
    assert_eq!(params["scope"], DEFAULT_SCOPE);
    assert_eq!(params["code_challenge"], "challenge");
    assert_eq!(params["code_challenge_method"], "S256");
    assert_eq!(params["access_type"], "offline");
}
