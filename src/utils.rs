use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

pub fn generate_code_verifier() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(128)
        .map(char::from)
        .collect()
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Builds the free-text search query for a song, e.g. `"Song Artist official audio"`.
pub fn build_search_query(title: &str, artist: &str, suffix: &str) -> String {
    [title.trim(), artist.trim(), suffix.trim()]
        .iter()
        .filter(|part| !part.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn now_timestamp() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// Returns true when every space-separated scope in `required` is part of `granted`.
pub fn scope_covers(granted: &str, required: &str) -> bool {
    let granted: Vec<&str> = granted.split_whitespace().collect();
    required
        .split_whitespace()
        .all(|scope| granted.contains(&scope))
}
