use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param},
};
use ytplcli::youtube::{CatalogError, InsertOutcome, SearchOutcome, YouTubeClient};

fn google_error(code: u16, reason: &str) -> Value {
    json!({
        "error": {
            "code": code,
            "message": format!("{reason} happened"),
            "errors": [{ "message": "detail", "domain": "youtube", "reason": reason }]
        }
    })
}

async fn client(server: &MockServer) -> YouTubeClient {
    YouTubeClient::new(&server.uri(), "test-token").unwrap()
}

#[tokio::test]
async fn test_find_playlist_id_matches_exact_title() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/playlists"))
        .and(query_param("mine", "true"))
        .and(query_param("maxResults", "50"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "id": "PL-lower", "snippet": { "title": "road trip" } },
                { "id": "PL-exact", "snippet": { "title": "Road Trip" } },
                { "id": "PL-second", "snippet": { "title": "Road Trip" } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let id = client(&server).await.find_playlist_id("Road Trip").await.unwrap();

    assert_eq!(id.as_deref(), Some("PL-exact"));
}

#[tokio::test]
async fn test_find_playlist_id_not_found_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/playlists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(&server)
        .await;

    let id = client(&server).await.find_playlist_id("Road Trip").await.unwrap();

    assert_eq!(id, None);
}

#[tokio::test]
async fn test_find_playlist_id_classifies_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/playlists"))
        .respond_with(ResponseTemplate::new(403).set_body_json(google_error(403, "quotaExceeded")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/playlists"))
        .respond_with(ResponseTemplate::new(401).set_body_json(google_error(401, "authError")))
        .mount(&server)
        .await;

    let client = client(&server).await;

    let first = client.find_playlist_id("Road Trip").await.unwrap_err();
    assert!(first.is_quota());

    let second = client.find_playlist_id("Road Trip").await.unwrap_err();
    assert!(second.is_unauthorized());
}

#[tokio::test]
async fn test_search_video_returns_top_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Airbag Radiohead official audio"))
        .and(query_param("type", "video"))
        .and(query_param("maxResults", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "id": { "kind": "youtube#video", "videoId": "abc123" },
                "snippet": { "title": "Radiohead - Airbag" }
            }]
        })))
        .mount(&server)
        .await;

    let outcome = client(&server)
        .await
        .search_video("Airbag Radiohead official audio")
        .await;

    match outcome {
        SearchOutcome::Found(video) => {
            assert_eq!(video.id, "abc123");
            assert_eq!(video.title, "Radiohead - Airbag");
        }
        other => panic!("expected a video, got {:?}", other),
    }
}

#[tokio::test]
async fn test_search_video_without_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(&server)
        .await;

    let outcome = client(&server).await.search_video("nothing").await;

    assert!(matches!(outcome, SearchOutcome::NotFound));
}

#[tokio::test]
async fn test_search_video_quota_is_distinct_from_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "quota"))
        .respond_with(ResponseTemplate::new(403).set_body_json(google_error(403, "quotaExceeded")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let client = client(&server).await;

    assert!(matches!(
        client.search_video("quota").await,
        SearchOutcome::QuotaExceeded
    ));
    match client.search_video("broken").await {
        SearchOutcome::Failed(CatalogError::Api(failure)) => {
            assert_eq!(failure.status.as_u16(), 500);
            assert_eq!(failure.message, "upstream exploded");
        }
        other => panic!("expected an API failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_insert_video_sends_playlist_item() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/playlistItems"))
        .and(query_param("part", "snippet"))
        .and(body_json(json!({
            "snippet": {
                "playlistId": "PL123",
                "resourceId": { "kind": "youtube#video", "videoId": "abc123" }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "item-1",
            "snippet": { "title": "Radiohead - Airbag" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client(&server).await.insert_video("PL123", "abc123").await;

    match outcome {
        InsertOutcome::Added { title } => assert_eq!(title, "Radiohead - Airbag"),
        other => panic!("expected the video to be added, got {:?}", other),
    }
}

#[tokio::test]
async fn test_insert_video_outcomes_by_reason() {
    let server = MockServer::start().await;
    let cases = [
        ("dup", 409, "videoAlreadyInPlaylist"),
        ("dup2", 400, "playlistItemDuplicate"),
        ("quota", 403, "quotaExceeded"),
        ("denied", 403, "forbidden"),
        ("gone", 404, "playlistNotFound"),
    ];
    for (video, status, reason) in cases {
        Mock::given(method("POST"))
            .and(path("/playlistItems"))
            .and(body_json(json!({
                "snippet": {
                    "playlistId": "PL123",
                    "resourceId": { "kind": "youtube#video", "videoId": video }
                }
            })))
            .respond_with(ResponseTemplate::new(status).set_body_json(google_error(status, reason)))
            .mount(&server)
            .await;
    }

    let client = client(&server).await;

    assert!(matches!(
        client.insert_video("PL123", "dup").await,
        InsertOutcome::Duplicate
    ));
    assert!(matches!(
        client.insert_video("PL123", "dup2").await,
        InsertOutcome::Duplicate
    ));
    assert!(matches!(
        client.insert_video("PL123", "quota").await,
        InsertOutcome::QuotaExceeded
    ));
    assert!(matches!(
        client.insert_video("PL123", "denied").await,
        InsertOutcome::Failed(CatalogError::Api(_))
    ));
    assert!(matches!(
        client.insert_video("PL123", "gone").await,
        InsertOutcome::Failed(CatalogError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_too_many_requests_counts_as_quota() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let outcome = client(&server).await.search_video("anything").await;

    assert!(matches!(outcome, SearchOutcome::QuotaExceeded));
}

#[test]
fn test_client_rejects_unusable_token() {
    assert!(matches!(
        YouTubeClient::new("http://localhost", ""),
        Err(CatalogError::Init(_))
    ));
    assert!(matches!(
        YouTubeClient::new("http://localhost", "bad\ntoken"),
        Err(CatalogError::Init(_))
    ));
}
