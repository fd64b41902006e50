//! Configuration management for the YouTube Playlist Filler.
//!
//! This module handles loading configuration values from environment variables
//! and `.env` files and folds them into one [`Config`] value that is validated
//! once, before any remote call is made.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Command-line flags (highest priority, applied by the CLI layer)
//! 2. Environment variables
//! 3. `.env` file in the local data directory
//! 4. Application defaults

use std::{
    env,
    net::SocketAddr,
    path::{Path, PathBuf},
    str::FromStr,
};

use thiserror::Error;

use crate::batch::Pacing;

/// Name shipped in `.env.example`; a run refuses to start while it is still set.
pub const PLAYLIST_NAME_PLACEHOLDER: &str = "Your Target YouTube Playlist Name";

pub const DEFAULT_API_URL: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/youtube.force-ssl";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8080";
pub const DEFAULT_SEARCH_SUFFIX: &str = "official audio";
pub const DEFAULT_INPUT_FILE: &str = "all.csv";
pub const DEFAULT_TITLE_COLUMN: &str = "Track Name";
pub const DEFAULT_ARTIST_COLUMN: &str = "Artist Name(s)";
pub const DEFAULT_URI_COLUMN: &str = "Track URI";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "The playlist name is still set to the placeholder '{}'. Set YTPL_PLAYLIST_NAME or pass --playlist.",
        PLAYLIST_NAME_PLACEHOLDER
    )]
    PlaylistPlaceholder,
    #[error("The playlist name must not be empty.")]
    EmptyPlaylistName,
    #[error("Input file '{}' not found.", .0.display())]
    InputNotFound(PathBuf),
    #[error("Invalid server address '{value}': {source}")]
    InvalidServerAddress {
        value: String,
        source: std::net::AddrParseError,
    },
}

/// Names of the CSV columns a song row is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Columns {
    pub title: String,
    pub artist: String,
    pub uri: String,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE_COLUMN.to_string(),
            artist: DEFAULT_ARTIST_COLUMN.to_string(),
            uri: DEFAULT_URI_COLUMN.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub input_file: PathBuf,
    pub playlist_name: String,
    pub client_secrets_file: PathBuf,
    pub token_file: PathBuf,
    pub progress_log_file: PathBuf,
    pub server_address: String,
    pub api_url: String,
    pub scope: String,
    pub search_suffix: String,
    pub columns: Columns,
    pub pacing: Pacing,
}

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Creates the directory structure if it doesn't exist. A missing `.env` file
/// is not an error; every setting has a default or can be given as a flag.
///
/// # Directory Structure
///
/// The function looks for the `.env` file in:
/// - Linux: `~/.local/share/ytplcli/.env`
/// - macOS: `~/Library/Application Support/ytplcli/.env`
/// - Windows: `%LOCALAPPDATA%/ytplcli/.env`
///
/// # Errors
///
/// Returns an error string if the data directory cannot be created or the
/// `.env` file exists but cannot be parsed.
pub async fn load_env() -> Result<(), String> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    match dotenv::from_path(&path) {
        Ok(()) => Ok(()),
        Err(dotenv::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(format!("Failed to load {}: {}", path.display(), e)),
    }
}

/// Returns the application's local data directory (`<data_local_dir>/ytplcli`).
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("ytplcli");
    path
}

fn var_or(name: &str, default: impl Into<String>) -> String {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => default.into(),
    }
}

fn path_or(name: &str, default: PathBuf) -> PathBuf {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value.trim()),
        _ => default,
    }
}

impl Config {
    /// Builds the configuration from `YTPL_*` environment variables and defaults.
    pub fn from_env() -> Self {
        let data = data_dir();
        Self {
            input_file: path_or("YTPL_INPUT_FILE", PathBuf::from(DEFAULT_INPUT_FILE)),
            playlist_name: var_or("YTPL_PLAYLIST_NAME", PLAYLIST_NAME_PLACEHOLDER),
            client_secrets_file: path_or(
                "YTPL_CLIENT_SECRETS_FILE",
                data.join("client_secrets.json"),
            ),
            token_file: path_or("YTPL_TOKEN_FILE", data.join("cache/token.json")),
            progress_log_file: path_or(
                "YTPL_PROGRESS_LOG_FILE",
                data.join("state/processed_songs.log"),
            ),
            server_address: var_or("YTPL_SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS),
            api_url: var_or("YTPL_API_URL", DEFAULT_API_URL)
                .trim_end_matches('/')
                .to_string(),
            scope: var_or("YTPL_AUTH_SCOPE", DEFAULT_SCOPE),
            search_suffix: var_or("YTPL_SEARCH_SUFFIX", DEFAULT_SEARCH_SUFFIX),
            columns: Columns {
                title: var_or("YTPL_TITLE_COLUMN", DEFAULT_TITLE_COLUMN),
                artist: var_or("YTPL_ARTIST_COLUMN", DEFAULT_ARTIST_COLUMN),
                uri: var_or("YTPL_URI_COLUMN", DEFAULT_URI_COLUMN),
            },
            pacing: Pacing::default(),
        }
    }

    /// Checks everything that can be checked without touching the network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let name = self.playlist_name.trim();
        if name.is_empty() {
            return Err(ConfigError::EmptyPlaylistName);
        }
        if name == PLAYLIST_NAME_PLACEHOLDER {
            return Err(ConfigError::PlaylistPlaceholder);
        }

        self.server_socket_addr()?;

        if !self.input_file.is_file() {
            return Err(ConfigError::InputNotFound(self.input_file.clone()));
        }

        Ok(())
    }

    pub fn server_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        SocketAddr::from_str(&self.server_address).map_err(|source| {
            ConfigError::InvalidServerAddress {
                value: self.server_address.clone(),
                source,
            }
        })
    }

    /// Redirect URI registered with the consent screen for the local callback server.
    pub fn redirect_uri(&self) -> String {
        format!("http://{}/callback", self.server_address)
    }

    pub fn with_input_file(mut self, path: Option<&Path>) -> Self {
        if let Some(path) = path {
            self.input_file = path.to_path_buf();
        }
        self
    }

    pub fn with_playlist_name(mut self, name: Option<&str>) -> Self {
        if let Some(name) = name {
            self.playlist_name = name.trim().to_string();
        }
        self
    }

    pub fn with_progress_log_file(mut self, path: Option<&Path>) -> Self {
        if let Some(path) = path {
            self.progress_log_file = path.to_path_buf();
        }
        self
    }
}
