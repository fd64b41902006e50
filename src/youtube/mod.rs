//! # YouTube Integration Module
//!
//! This module provides the interface to the YouTube Data API v3 that the run
//! controller drives: resolving the target playlist by name, searching for a
//! video per song, and inserting the found video into the playlist. It also
//! implements the OAuth 2.0 consent flow used to obtain access tokens.
//!
//! ## Architecture
//!
//! ```text
//! Run Controller (batch)
//!          ↓
//! Catalog trait
//!          ↓
//! YouTubeClient
//!     ├── Playlists (list mine, insert item)
//!     └── Search (top-1 video)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//!          ↓
//! YouTube Data API v3
//! ```
//!
//! ## Error Handling
//!
//! Failures are classified from the HTTP status and the structured
//! `error.errors[].reason` codes of the Google error body:
//!
//! - **401** - [`CatalogError::Unauthorized`], the credential must be renewed
//! - **Quota reasons / 429** - quota exhaustion, the batch has to stop
//! - **Duplicate reasons** - the video is already in the playlist (insert only)
//! - **404** - [`CatalogError::NotFound`]
//! - **Anything else** - [`CatalogError::Api`] or [`CatalogError::Transport`]
//!
//! Search and insert report their results as tagged outcomes
//! ([`SearchOutcome`], [`InsertOutcome`]) so a quota signal can never be
//! mistaken for an ordinary miss.
//!
//! ## API Coverage
//!
//! - `GET /playlists?mine=true` - the caller's playlists (first 50)
//! - `GET /search?type=video` - top-1 video search
//! - `POST /playlistItems` - add a video to a playlist

pub mod auth;
mod client;
mod playlists;
mod search;

pub use client::{ApiFailure, CatalogError, YouTubeClient, classify};
pub use playlists::PLAYLIST_PAGE_SIZE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundVideo {
    pub id: String,
    pub title: String,
}

#[derive(Debug)]
pub enum SearchOutcome {
    Found(FoundVideo),
    NotFound,
    QuotaExceeded,
    Failed(CatalogError),
}

#[derive(Debug)]
pub enum InsertOutcome {
    Added { title: String },
    Duplicate,
    QuotaExceeded,
    Failed(CatalogError),
}

/// The remote operations the run controller needs from a media platform.
#[allow(async_fn_in_trait)]
pub trait Catalog {
    /// Resolves a playlist name to its id; `Ok(None)` when it does not exist.
    async fn find_collection_id(&self, name: &str) -> Result<Option<String>, CatalogError>;

    async fn search_item(&self, query: &str) -> SearchOutcome;

    async fn insert_item(&self, collection_id: &str, item_id: &str) -> InsertOutcome;
}

impl Catalog for YouTubeClient {
    async fn find_collection_id(&self, name: &str) -> Result<Option<String>, CatalogError> {
        self.find_playlist_id(name).await
    }

    async fn search_item(&self, query: &str) -> SearchOutcome {
        self.search_video(query).await
    }

    async fn insert_item(&self, collection_id: &str, item_id: &str) -> InsertOutcome {
        self.insert_video(collection_id, item_id).await
    }
}
