use crate::{
    Res,
    config::{Config, ConfigError},
    management::CredentialManager,
    success,
    youtube::auth::BrowserAuthorizer,
};

pub(crate) fn credential_manager(
    config: &Config,
) -> Result<CredentialManager<BrowserAuthorizer>, ConfigError> {
    let addr = config.server_socket_addr()?;

    Ok(CredentialManager::new(
        config.token_file.clone(),
        config.client_secrets_file.clone(),
        config.scope.clone(),
        BrowserAuthorizer::new(addr, config.redirect_uri()),
    ))
}

pub async fn auth(config: Config, force: bool) -> Res<()> {
    let credentials = credential_manager(&config)?;

    if force {
        credentials.discard().await?;
    }

    credentials
        .obtain()
        .await
        .map_err(|e| format!("Authentication failed: {e}"))?;
    success!(
        "Authentication successful! Credentials are stored in {}",
        credentials.token_path().display()
    );
    Ok(())
}
