use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, response::Html};
use reqwest::Client;
use tokio::sync::Mutex;

use crate::{types::PkceSession, warning, youtube::auth::exchange_code_pkce};

pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(shared_state): Extension<Arc<Mutex<PkceSession>>>,
) -> Html<&'static str> {
    let session = {
        let mut session = shared_state.lock().await;

        if let Some(error) = params.get("error") {
            session.failure = Some(error.clone());
            return Html("<h4>Authorization was denied.</h4>");
        }

        session.clone()
    };

    let Some(code) = params.get("code") else {
        return Html("<h4>Missing authorization code.</h4>");
    };

    // Unlocked during the exchange; the authorizer keeps polling the session.
    let result = exchange_code_pkce(&Client::new(), &session, code).await;

    let mut session = shared_state.lock().await;
    match result {
        Ok(token) => {
            session.token = Some(token);
            Html("<h2>Authentication successful.</h2><p>Close browser window.</p>")
        }
        Err(e) => {
            warning!("Token exchange failed: {}", e);
            session.failure = Some(e.to_string());
            Html("<h4>Login failed.</h4>")
        }
    }
}
