use crate::{
    types::SearchListResponse,
    youtube::{
        FoundVideo, SearchOutcome,
        client::{ApiFailure, CatalogError, YouTubeClient, classify},
    },
};

impl YouTubeClient {
    /// Runs a single top-1 video search for `query`.
    pub async fn search_video(&self, query: &str) -> SearchOutcome {
        let res = match self
            .http
            .get(self.endpoint("search"))
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("maxResults", "1"),
                ("q", query),
            ])
            .send()
            .await
        {
            Ok(res) => res,
            Err(e) => return SearchOutcome::Failed(CatalogError::Transport(e)),
        };

        if !res.status().is_success() {
            return match classify(ApiFailure::from_response(res).await) {
                CatalogError::QuotaExceeded(_) => SearchOutcome::QuotaExceeded,
                other => SearchOutcome::Failed(other),
            };
        }

        let results = match res.json::<SearchListResponse>().await {
            Ok(results) => results,
            Err(e) => return SearchOutcome::Failed(CatalogError::Transport(e)),
        };

        results
            .items
            .into_iter()
            .find_map(|item| {
                let title = item.snippet.map(|s| s.title).unwrap_or_default();
                item.id.video_id.map(|id| FoundVideo { id, title })
            })
            .map(SearchOutcome::Found)
            .unwrap_or(SearchOutcome::NotFound)
    }
}
