use std::{io::ErrorKind, path::PathBuf};

use reqwest::Client;

use crate::{
    info, success,
    types::{ClientSecrets, ClientSecretsFile, Token},
    utils, warning,
    youtube::auth::{AuthError, refresh_token},
};

/// Seconds before the nominal expiry at which a token is treated as expired.
const EXPIRY_MARGIN_SECS: u64 = 240;

/// Interactive step that turns user consent into a fresh token.
#[allow(async_fn_in_trait)]
pub trait Authorizer {
    async fn authorize(&self, secrets: &ClientSecrets, scope: &str) -> Result<Token, AuthError>;
}

pub struct CredentialManager<A> {
    token_path: PathBuf,
    secrets_path: PathBuf,
    scope: String,
    authorizer: A,
    http: Client,
}

impl<A: Authorizer> CredentialManager<A> {
    pub fn new(token_path: PathBuf, secrets_path: PathBuf, scope: String, authorizer: A) -> Self {
        Self {
            token_path,
            secrets_path,
            scope,
            authorizer,
            http: Client::new(),
        }
    }

    /// Returns a usable token.
    ///
    /// A valid stored token is returned unchanged. An expired one is refreshed;
    /// if that fails, or no usable token is stored, the authorizer is asked for
    /// a new one. Refreshed and newly authorized tokens are persisted before
    /// they are returned.
    pub async fn obtain(&self) -> Result<Token, AuthError> {
        let stored = self.load().await;

        if let Some(token) = &stored {
            if self.is_usable(token) {
                return Ok(token.clone());
            }
        }

        let secrets = self.load_secrets().await?;

        let refreshed = match stored {
            Some(token)
                if token.refresh_token.is_some() && utils::scope_covers(&token.scope, &self.scope) =>
            {
                info!("Refreshing access token...");
                match refresh_token(&self.http, &secrets, &token).await {
                    Ok(token) => Some(token),
                    Err(e) => {
                        warning!("Error refreshing token: {}", e);
                        info!("Need to re-authenticate.");
                        None
                    }
                }
            }
            _ => {
                info!("Need to authenticate.");
                None
            }
        };

        let token = match refreshed {
            Some(token) => token,
            None => self.authorizer.authorize(&secrets, &self.scope).await?,
        };

        self.persist(&token).await?;
        success!("Credentials saved to {}", self.token_path.display());
        Ok(token)
    }

    /// Throws away the stored token and runs the authorization again.
    pub async fn reauthorize(&self) -> Result<Token, AuthError> {
        self.discard().await?;
        self.obtain().await
    }

    /// Deletes the stored token so the next run has to authorize again.
    pub async fn discard(&self) -> Result<(), AuthError> {
        match async_fs::remove_file(&self.token_path).await {
            Ok(()) => {
                warning!(
                    "Deleted potentially invalid {}.",
                    self.token_path.display()
                );
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(AuthError::Discard {
                path: self.token_path.clone(),
                source,
            }),
        }
    }

    pub fn token_path(&self) -> &PathBuf {
        &self.token_path
    }

    pub fn authorizer(&self) -> &A {
        &self.authorizer
    }

    fn is_usable(&self, token: &Token) -> bool {
        !token.access_token.is_empty()
            && !is_expired(token)
            && utils::scope_covers(&token.scope, &self.scope)
    }

    async fn load(&self) -> Option<Token> {
        let content = match async_fs::read_to_string(&self.token_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warning!(
                    "Failed to read credentials from {}: {}",
                    self.token_path.display(),
                    e
                );
                return None;
            }
        };

        match serde_json::from_str::<Token>(&content) {
            Ok(token) => Some(token),
            Err(e) => {
                warning!(
                    "Ignoring unreadable credentials in {}: {}",
                    self.token_path.display(),
                    e
                );
                None
            }
        }
    }

    async fn persist(&self, token: &Token) -> Result<(), AuthError> {
        let persist_err = |source: std::io::Error| AuthError::Persist {
            path: self.token_path.clone(),
            source,
        };

        if let Some(parent) = self.token_path.parent() {
            if !parent.as_os_str().is_empty() {
                async_fs::create_dir_all(parent)
                    .await
                    .map_err(persist_err)?;
            }
        }

        let json = serde_json::to_string_pretty(token)
            .map_err(|e| persist_err(std::io::Error::other(e)))?;
        async_fs::write(&self.token_path, json)
            .await
            .map_err(persist_err)
    }

    async fn load_secrets(&self) -> Result<ClientSecrets, AuthError> {
        let content = async_fs::read_to_string(&self.secrets_path)
            .await
            .map_err(|source| AuthError::ClientSecretsRead {
                path: self.secrets_path.clone(),
                source,
            })?;

        parse_client_secrets(&content).map_err(|reason| AuthError::ClientSecretsInvalid {
            path: self.secrets_path.clone(),
            reason,
        })
    }
}

fn is_expired(token: &Token) -> bool {
    let expires_at = token.obtained_at.saturating_add(token.expires_in);
    utils::now_timestamp().saturating_add(EXPIRY_MARGIN_SECS) >= expires_at
}

/// Parses a client secrets file holding an `installed` or `web` client.
pub fn parse_client_secrets(content: &str) -> Result<ClientSecrets, String> {
    let file: ClientSecretsFile = serde_json::from_str(content).map_err(|e| e.to_string())?;
    file.installed
        .or(file.web)
        .ok_or_else(|| "expected an \"installed\" or \"web\" client entry".to_string())
}
