use crate::{
    types::{
        InsertPlaylistItemRequest, InsertPlaylistItemResponse, InsertPlaylistItemSnippet,
        PlaylistListResponse, ResourceId,
    },
    youtube::{
        InsertOutcome,
        client::{ApiFailure, CatalogError, DUPLICATE_REASONS, YouTubeClient, classify},
    },
};

/// Page size used when listing the caller's playlists.
pub const PLAYLIST_PAGE_SIZE: u32 = 50;

impl YouTubeClient {
    /// Looks up the id of the caller's playlist titled exactly `name`.
    ///
    /// Only the first page of playlists is scanned. Returns `Ok(None)` when no
    /// playlist on that page matches; the comparison is case-sensitive.
    pub async fn find_playlist_id(&self, name: &str) -> Result<Option<String>, CatalogError> {
        let page_size = PLAYLIST_PAGE_SIZE.to_string();
        let res = self
            .http
            .get(self.endpoint("playlists"))
            .query(&[
                ("part", "snippet"),
                ("mine", "true"),
                ("maxResults", page_size.as_str()),
            ])
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(classify(ApiFailure::from_response(res).await));
        }

        let playlists = res.json::<PlaylistListResponse>().await?;

        Ok(playlists
            .items
            .into_iter()
            .find(|playlist| playlist.snippet.title == name)
            .map(|playlist| playlist.id))
    }

    /// Inserts the video into the playlist.
    ///
    /// The API's duplicate reason codes are reported as
    /// [`InsertOutcome::Duplicate`] rather than as a failure.
    pub async fn insert_video(&self, playlist_id: &str, video_id: &str) -> InsertOutcome {
        let body = InsertPlaylistItemRequest {
            snippet: InsertPlaylistItemSnippet {
                playlist_id: playlist_id.to_string(),
                resource_id: ResourceId {
                    kind: "youtube#video".to_string(),
                    video_id: video_id.to_string(),
                },
            },
        };

        let res = match self
            .http
            .post(self.endpoint("playlistItems"))
            .query(&[("part", "snippet")])
            .json(&body)
            .send()
            .await
        {
            Ok(res) => res,
            Err(e) => return InsertOutcome::Failed(CatalogError::Transport(e)),
        };

        if !res.status().is_success() {
            let failure = ApiFailure::from_response(res).await;
            if failure.has_reason(DUPLICATE_REASONS) {
                return InsertOutcome::Duplicate;
            }
            return match classify(failure) {
                CatalogError::QuotaExceeded(_) => InsertOutcome::QuotaExceeded,
                other => InsertOutcome::Failed(other),
            };
        }

        // The item is in the playlist at this point; an unreadable body only loses the title.
        let title = res
            .json::<InsertPlaylistItemResponse>()
            .await
            .ok()
            .and_then(|item| item.snippet)
            .map(|snippet| snippet.title)
            .unwrap_or_default();

        InsertOutcome::Added { title }
    }
}
