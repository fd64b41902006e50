use std::fmt;

use reqwest::{
    Client, Response, StatusCode,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use thiserror::Error;

use crate::types::ApiErrorResponse;

const QUOTA_REASONS: &[&str] = &[
    "quotaExceeded",
    "dailyLimitExceeded",
    "rateLimitExceeded",
    "userRateLimitExceeded",
];

pub(crate) const DUPLICATE_REASONS: &[&str] = &["playlistItemDuplicate", "videoAlreadyInPlaylist"];

/// A non-success response of the YouTube Data API.
#[derive(Debug, Clone)]
pub struct ApiFailure {
    pub status: StatusCode,
    pub reasons: Vec<String>,
    pub message: String,
}

impl ApiFailure {
    pub fn has_reason(&self, candidates: &[&str]) -> bool {
        self.reasons
            .iter()
            .any(|reason| candidates.contains(&reason.as_str()))
    }

    pub(crate) async fn from_response(res: Response) -> Self {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        let parsed: ApiErrorResponse = serde_json::from_str(&body).unwrap_or_default();

        let message = if parsed.error.message.is_empty() {
            body
        } else {
            parsed.error.message
        };

        Self {
            status,
            reasons: parsed
                .error
                .errors
                .into_iter()
                .map(|detail| detail.reason)
                .filter(|reason| !reason.is_empty())
                .collect(),
            message,
        }
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status.as_u16())?;
        if !self.reasons.is_empty() {
            write!(f, " [{}]", self.reasons.join(", "))?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Authentication error ({0}). Your access token might be invalid or expired.")]
    Unauthorized(ApiFailure),
    #[error("YouTube API quota exceeded ({0}).")]
    QuotaExceeded(ApiFailure),
    #[error("Resource not found ({0}).")]
    NotFound(ApiFailure),
    #[error("YouTube API error ({0}).")]
    Api(ApiFailure),
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Failed to initialize YouTube client: {0}")]
    Init(String),
}

impl CatalogError {
    pub fn is_quota(&self) -> bool {
        matches!(self, CatalogError::QuotaExceeded(_))
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CatalogError::Unauthorized(_))
    }
}

/// Maps an API failure onto the error taxonomy by status and structured reason.
pub fn classify(failure: ApiFailure) -> CatalogError {
    if failure.status == StatusCode::UNAUTHORIZED {
        CatalogError::Unauthorized(failure)
    } else if failure.status == StatusCode::TOO_MANY_REQUESTS || failure.has_reason(QUOTA_REASONS)
    {
        CatalogError::QuotaExceeded(failure)
    } else if failure.status == StatusCode::NOT_FOUND {
        CatalogError::NotFound(failure)
    } else {
        CatalogError::Api(failure)
    }
}

/// Bearer-authenticated client for the YouTube Data API v3.
pub struct YouTubeClient {
    pub(crate) http: Client,
    pub(crate) api_url: String,
}

impl YouTubeClient {
    pub fn new(api_url: &str, access_token: &str) -> Result<Self, CatalogError> {
        if access_token.trim().is_empty() {
            return Err(CatalogError::Init("access token is empty".to_string()));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {access_token}"))
            .map_err(|e| CatalogError::Init(e.to_string()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| CatalogError::Init(e.to_string()))?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path)
    }
}
