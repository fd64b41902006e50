use serde::{Deserialize, Serialize};
use tabled::Tabled;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: String,
    pub expires_in: u64,
    pub obtained_at: u64,
}

/// State shared between the authorization flow and the callback handler.
#[derive(Debug, Clone)]
pub struct PkceSession {
    pub code_verifier: String,
    pub redirect_uri: String,
    pub scope: String,
    pub secrets: ClientSecrets,
    pub token: Option<Token>,
    pub failure: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    "https://accounts.google.com/o/oauth2/auth".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// Layout of the `client_secrets.json` file downloaded from the Google Cloud console.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecretsFile {
    pub installed: Option<ClientSecrets>,
    pub web: Option<ClientSecrets>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongRow {
    pub line: u64,
    pub title: String,
    pub artist: String,
    pub external_uri: String,
}

impl SongRow {
    pub fn has_uri(&self) -> bool {
        !self.external_uri.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        !self.title.is_empty() && !self.artist.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistListResponse {
    #[serde(default)]
    pub items: Vec<Playlist>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub snippet: PlaylistSnippet,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistSnippet {
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchListResponse {
    #[serde(default)]
    pub items: Vec<SearchResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    pub id: SearchResultId,
    pub snippet: Option<VideoSnippet>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultId {
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoSnippet {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InsertPlaylistItemRequest {
    pub snippet: InsertPlaylistItemSnippet,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertPlaylistItemSnippet {
    pub playlist_id: String,
    pub resource_id: ResourceId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceId {
    pub kind: String,
    pub video_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsertPlaylistItemResponse {
    pub snippet: Option<VideoSnippet>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub reason: String,
}

#[derive(Tabled)]
pub struct SummaryTableRow {
    pub outcome: String,
    pub count: usize,
}
