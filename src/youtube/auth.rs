use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::sync::Mutex;
use url::Url;

use crate::{
    management::Authorizer,
    server,
    types::{ClientSecrets, PkceSession, Token, TokenResponse},
    utils, warning,
};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Failed to read client secrets file '{}': {source}", .path.display())]
    ClientSecretsRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Client secrets file '{}' is invalid: {reason}", .path.display())]
    ClientSecretsInvalid { path: PathBuf, reason: String },
    #[error("Invalid authorization URL '{url}': {source}")]
    InvalidAuthUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("Token request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Token endpoint rejected the request ({status}): {body}")]
    Rejected { status: StatusCode, body: String },
    #[error("Local callback server failed: {0}")]
    Server(std::io::Error),
    #[error("Authorization was denied: {0}")]
    Denied(String),
    #[error("The stored credentials carry no refresh token.")]
    NoRefreshToken,
    #[error("Authorization timed out after {0} seconds.")]
    Timeout(u64),
    #[error("Failed to save credentials to '{}': {source}", .path.display())]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to remove credentials file '{}': {source}", .path.display())]
    Discard {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Interactive consent through the user's browser using the OAuth 2.0
/// authorization code flow with PKCE.
///
/// 1. **PKCE Setup**: Generates a random code verifier and derives the S256 challenge
/// 2. **Server Start**: Binds the local callback server on the configured address
/// 3. **Browser Launch**: Opens the Google consent page in the default browser
/// 4. **Callback Handling**: The callback handler exchanges the code for a token
/// 5. **Shutdown**: The callback server is stopped once a token arrived or the wait timed out
pub struct BrowserAuthorizer {
    addr: SocketAddr,
    redirect_uri: String,
    timeout: Duration,
}

impl BrowserAuthorizer {
    pub fn new(addr: SocketAddr, redirect_uri: String) -> Self {
        Self {
            addr,
            redirect_uri,
            timeout: Duration::from_secs(120),
        }
    }
}

impl Authorizer for BrowserAuthorizer {
    async fn authorize(&self, secrets: &ClientSecrets, scope: &str) -> Result<Token, AuthError> {
        let code_verifier = utils::generate_code_verifier();
        let code_challenge = utils::generate_code_challenge(&code_verifier);

        let auth_url = consent_url(secrets, &self.redirect_uri, scope, &code_challenge)?;

        let shared_state = Arc::new(Mutex::new(PkceSession {
            code_verifier,
            redirect_uri: self.redirect_uri.clone(),
            scope: scope.to_string(),
            secrets: secrets.clone(),
            token: None,
            failure: None,
        }));

        let listener = server::bind(self.addr).await.map_err(AuthError::Server)?;
        let server_state = Arc::clone(&shared_state);
        let server = tokio::spawn(async move {
            if let Err(e) = server::serve(listener, server_state).await {
                warning!("Callback server stopped: {}", e);
            }
        });

        if webbrowser::open(auth_url.as_str()).is_err() {
            warning!(
                "Failed to open browser. Please navigate to the following URL manually:\n{}",
                auth_url
            )
        }

        let result = wait_for_token(shared_state, self.timeout).await;
        server.abort();
        result
    }
}

/// Builds the consent page URL the user is sent to.
pub fn consent_url(
    secrets: &ClientSecrets,
    redirect_uri: &str,
    scope: &str,
    code_challenge: &str,
) -> Result<Url, AuthError> {
    Url::parse_with_params(
        &secrets.auth_uri,
        &[
            ("client_id", secrets.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
            ("scope", scope),
            ("code_challenge", code_challenge),
            ("code_challenge_method", "S256"),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ],
    )
    .map_err(|source| AuthError::InvalidAuthUrl {
        url: secrets.auth_uri.clone(),
        source,
    })
}

async fn wait_for_token(
    shared_state: Arc<Mutex<PkceSession>>,
    max_wait: Duration,
) -> Result<Token, AuthError> {
    use std::time::Instant;

    let pb = ProgressBar::new_spinner();
    pb.set_message("Waiting for authorization in your browser...");
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }

    let start = Instant::now();

    while start.elapsed() < max_wait {
        let lock = shared_state.lock().await;
        if let Some(token) = &lock.token {
            pb.finish_and_clear();
            return Ok(token.clone());
        }
        if let Some(failure) = &lock.failure {
            pb.finish_and_clear();
            return Err(AuthError::Denied(failure.clone()));
        }
        drop(lock);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    pb.finish_and_clear();
    Err(AuthError::Timeout(max_wait.as_secs()))
}

async fn request_token(
    http: &Client,
    token_uri: &str,
    form: &[(&str, &str)],
) -> Result<TokenResponse, AuthError> {
    let res = http.post(token_uri).form(form).send().await?;

    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(AuthError::Rejected { status, body });
    }

    Ok(res.json::<TokenResponse>().await?)
}

fn token_from_response(
    response: TokenResponse,
    previous_refresh: Option<&str>,
    requested_scope: &str,
) -> Token {
    Token {
        access_token: response.access_token,
        refresh_token: response
            .refresh_token
            .or_else(|| previous_refresh.map(str::to_string)),
        scope: response
            .scope
            .unwrap_or_else(|| requested_scope.to_string()),
        expires_in: response.expires_in.unwrap_or(3600),
        obtained_at: utils::now_timestamp(),
    }
}

/// Exchanges a refresh token for a new access token.
///
/// Google usually omits `refresh_token` from the response; the previous one is
/// kept in that case.
pub async fn refresh_token(
    http: &Client,
    secrets: &ClientSecrets,
    token: &Token,
) -> Result<Token, AuthError> {
    let Some(refresh) = token.refresh_token.as_deref() else {
        return Err(AuthError::NoRefreshToken);
    };

    let mut form = vec![
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh),
        ("client_id", secrets.client_id.as_str()),
    ];
    if let Some(secret) = secrets.client_secret.as_deref() {
        form.push(("client_secret", secret));
    }

    let response = request_token(http, &secrets.token_uri, &form).await?;
    Ok(token_from_response(response, Some(refresh), &token.scope))
}

/// Exchanges an authorization code for an access token using PKCE.
///
/// The verifier must match the challenge that was sent with the consent request.
pub async fn exchange_code_pkce(
    http: &Client,
    session: &PkceSession,
    code: &str,
) -> Result<Token, AuthError> {
    let mut form = vec![
        ("grant_type", "authorization_code"),
        ("client_id", session.secrets.client_id.as_str()),
        ("code", code),
        ("code_verifier", session.code_verifier.as_str()),
        ("redirect_uri", session.redirect_uri.as_str()),
    ];
    if let Some(secret) = session.secrets.client_secret.as_deref() {
        form.push(("client_secret", secret));
    }

    let response = request_token(http, &session.secrets.token_uri, &form).await?;
    Ok(token_from_response(response, None, &session.scope))
}
