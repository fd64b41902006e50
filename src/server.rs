use axum::{Extension, Router, routing::get};
use std::{net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, sync::Mutex};

use crate::{api, types::PkceSession};

pub fn router(state: Arc<Mutex<PkceSession>>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/callback", get(api::callback).layer(Extension(state)))
}

pub async fn bind(addr: SocketAddr) -> std::io::Result<TcpListener> {
    TcpListener::bind(addr).await
}

pub async fn serve(listener: TcpListener, state: Arc<Mutex<PkceSession>>) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}
