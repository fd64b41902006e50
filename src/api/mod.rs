//! # API Module
//!
//! HTTP endpoints served by the local callback server while the browser
//! consent flow is running.
//!
//! ## Endpoints
//!
//! - [`callback`] - Receives the redirect from Google's authorization server and
//!   exchanges the authorization code (with the PKCE verifier) for a token. The
//!   result, or the reason consent failed, is written into the shared
//!   [`PkceSession`](crate::types::PkceSession) the authorizer is polling.
//! - [`health`] - Reports status, name and version of the running binary.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use axum::{Router, routing::get};
//! use ytplcli::api::{callback, health};
//!
//! let app = Router::new()
//!     .route("/callback", get(callback))
//!     .route("/health", get(health));
//! ```
//!
//! ## Related Modules
//!
//! - [`crate::server`] - Binds and serves these routes
//! - [`crate::youtube::auth`] - Token exchange and the browser authorizer

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
