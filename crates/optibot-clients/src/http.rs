//! Reqwest-backed implementation of the collaborator contracts.

use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt};
use std::path::Path;
use std::time::Duration;
use tokio_util::io::ReaderStream;
use tracing::debug;

use optibot_models::{Episode, HistoryItem, MediaItem, MediaKind, Movie, QueueItem, WorkItem};

use crate::error::{ClientError, ClientResult};
use crate::services::{HistoryService, MediaDownload, MetadataService, QueueService, WorkService};

/// Client for the optibot backend API.
///
/// Two underlying reqwest clients are kept: `api` bounds the whole request
/// (metadata and queue calls must never hang), while `transfer` bounds only
/// connection setup so multi-gigabyte downloads and uploads can run as long
/// as they need.
#[derive(Debug, Clone)]
pub struct ApiClient {
    api: reqwest::Client,
    transfer: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl ApiClient {
    /// Build a client for the given base URL and basic-auth credentials.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> ClientResult<Self> {
        let base_url = base_url.into();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ClientError::InvalidBaseUrl(base_url));
        }

        let api = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        let transfer = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()?;

        Ok(Self {
            api,
            transfer,
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api
            .get(self.url(path))
            .basic_auth(&self.username, Some(&self.password))
    }

    fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.api
            .delete(self.url(path))
            .basic_auth(&self.username, Some(&self.password))
    }

    fn metadata_path(kind: MediaKind, suffix: &str) -> String {
        match kind {
            MediaKind::Movie => format!("/api/v1/movies{}", suffix),
            MediaKind::Episode => format!("/api/v1/episodes{}", suffix),
        }
    }
}

fn expect_success(resp: reqwest::Response, endpoint: &str) -> ClientResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(ClientError::status(status.as_u16(), endpoint))
    }
}

#[async_trait]
impl QueueService for ApiClient {
    async fn next(&self) -> ClientResult<Option<QueueItem>> {
        let endpoint = "/api/v1/encoding/queue/next";
        let resp = self.get(endpoint).send().await?;

        // An empty queue is not an error
        match resp.status().as_u16() {
            204 | 404 => return Ok(None),
            _ => {}
        }

        let resp = expect_success(resp, endpoint)?;
        let item = resp.json::<QueueItem>().await?;
        Ok(Some(item))
    }

    async fn delete(&self, id: i64) -> ClientResult<()> {
        let endpoint = format!("/api/v1/encoding/queue/{}", id);
        let resp = self.delete(&endpoint).send().await?;
        expect_success(resp, &endpoint)?;
        Ok(())
    }
}

#[async_trait]
impl WorkService for ApiClient {
    async fn list(&self) -> ClientResult<Vec<WorkItem>> {
        let endpoint = "/api/v1/encoding/work";
        let resp = expect_success(self.get(endpoint).send().await?, endpoint)?;
        Ok(resp.json().await?)
    }

    async fn create(&self, item: &WorkItem) -> ClientResult<i64> {
        let endpoint = "/api/v1/encoding/work";
        let resp = self
            .api
            .post(self.url(endpoint))
            .basic_auth(&self.username, Some(&self.password))
            .json(item)
            .send()
            .await?;
        let resp = expect_success(resp, endpoint)?;
        Ok(resp.json().await?)
    }

    async fn update(&self, id: i64, progress: &str) -> ClientResult<()> {
        let endpoint = format!("/api/v1/encoding/work/{}", id);
        let resp = self
            .api
            .put(self.url(&endpoint))
            .basic_auth(&self.username, Some(&self.password))
            .query(&[("progress", progress)])
            .send()
            .await?;
        expect_success(resp, &endpoint)?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> ClientResult<()> {
        let endpoint = format!("/api/v1/encoding/work/{}", id);
        let resp = self.delete(&endpoint).send().await?;
        expect_success(resp, &endpoint)?;
        Ok(())
    }
}

#[async_trait]
impl MetadataService for ApiClient {
    async fn get(&self, kind: MediaKind, id: i64) -> ClientResult<MediaItem> {
        let endpoint = Self::metadata_path(kind, &format!("/{}", id));
        let resp = expect_success(self.get(&endpoint).send().await?, &endpoint)?;

        // Deserialize through the kind-specific struct so a field overlap
        // between movies and episodes can never mis-tag the result.
        let item = match kind {
            MediaKind::Movie => MediaItem::Movie(resp.json::<Movie>().await?),
            MediaKind::Episode => MediaItem::Episode(resp.json::<Episode>().await?),
        };
        Ok(item)
    }

    async fn download(&self, kind: MediaKind, id: i64) -> ClientResult<MediaDownload> {
        let endpoint = Self::metadata_path(kind, &format!("/download/{}", id));
        let resp = self
            .transfer
            .get(self.url(&endpoint))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;
        let resp = expect_success(resp, &endpoint)?;

        let size = resp
            .content_length()
            .ok_or_else(|| ClientError::malformed(&endpoint, "missing Content-Length"))?;

        debug!("Opened download of {} {} ({} bytes)", kind, id, size);

        let stream = resp
            .bytes_stream()
            .map_err(|e| std::io::Error::other(e))
            .boxed();

        Ok(MediaDownload { size, stream })
    }

    async fn upload(&self, kind: MediaKind, id: i64, path: &Path) -> ClientResult<()> {
        let endpoint = Self::metadata_path(kind, "/upload");
        let file = tokio::fs::File::open(path).await?;
        let size = file.metadata().await?.len();

        debug!("Uploading {} {} ({} bytes)", kind, id, size);

        let resp = self
            .transfer
            .post(self.url(&endpoint))
            .basic_auth(&self.username, Some(&self.password))
            .header("Content-Id", id)
            .header(reqwest::header::CONTENT_LENGTH, size)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(reqwest::Body::wrap_stream(ReaderStream::new(file)))
            .send()
            .await?;
        expect_success(resp, &endpoint)?;
        Ok(())
    }
}

#[async_trait]
impl HistoryService for ApiClient {
    async fn create(&self, item: &HistoryItem) -> ClientResult<i64> {
        let endpoint = "/api/v1/encoding/history";
        let resp = self
            .api
            .post(self.url(endpoint))
            .basic_auth(&self.username, Some(&self.password))
            .json(item)
            .send()
            .await?;
        let resp = expect_success(resp, endpoint)?;
        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // base64("user:pass")
    const BASIC_AUTH: &str = "Basic dXNlcjpwYXNz";

    async fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(server.uri(), "user", "pass", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn rejects_non_http_base_url() {
        let result = ApiClient::new("ftp://example", "u", "p", Duration::from_secs(5));
        assert!(matches!(result, Err(ClientError::InvalidBaseUrl(_))));
    }

    #[tokio::test]
    async fn queue_next_returns_item_with_auth_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/encoding/queue/next"))
            .and(header("Authorization", BASIC_AUTH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 3, "mediaKind": "movie", "mediaId": 42
            })))
            .expect(1)
            .mount(&server)
            .await;

        let item = QueueService::next(&client(&server).await).await.unwrap();
        let item = item.unwrap();
        assert_eq!(item.id, 3);
        assert_eq!(item.media_id, 42);
    }

    #[tokio::test]
    async fn queue_next_maps_empty_queue_to_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/encoding/queue/next"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let item = QueueService::next(&client(&server).await).await.unwrap();
        assert!(item.is_none());
    }

    #[tokio::test]
    async fn queue_next_maps_server_error_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/encoding/queue/next"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = QueueService::next(&client(&server).await)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn work_create_posts_item_and_returns_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/encoding/work"))
            .and(header("Authorization", BASIC_AUTH))
            .respond_with(ResponseTemplate::new(200).set_body_json(17))
            .expect(1)
            .mount(&server)
            .await;

        let queue_item = QueueItem {
            id: 3,
            media_kind: MediaKind::Movie,
            media_id: 42,
        };
        let item = WorkItem::claim(&queue_item, "encoder-1");
        let id = WorkService::create(&client(&server).await, &item)
            .await
            .unwrap();
        assert_eq!(id, 17);
    }

    #[tokio::test]
    async fn work_update_sends_progress_query_param() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/encoding/work/17"))
            .and(query_param("progress", "50.00%"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        WorkService::update(&client(&server).await, 17, "50.00%")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn metadata_get_routes_by_kind() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/episodes/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 7,
                "title": "Pilot",
                "number": 1,
                "season": 1,
                "show": {"name": "Example Show", "folderName": "Example Show (2008)"},
                "filename": "S01E01 - Pilot.mkv",
                "filetype": "mkv",
                "isOptimized": false
            })))
            .mount(&server)
            .await;

        let item = MetadataService::get(&client(&server).await, MediaKind::Episode, 7)
            .await
            .unwrap();
        assert_eq!(item.kind(), MediaKind::Episode);
        assert_eq!(item.id(), 7);
        assert_eq!(item.filetype(), "mkv");
    }

    #[tokio::test]
    async fn download_exposes_size_and_streams_bytes() {
        let server = MockServer::start().await;
        let body = vec![0xABu8; 2048];
        Mock::given(method("GET"))
            .and(path("/api/v1/movies/download/42"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .mount(&server)
            .await;

        let mut download = MetadataService::download(&client(&server).await, MediaKind::Movie, 42)
            .await
            .unwrap();
        assert_eq!(download.size, 2048);

        let mut received = 0usize;
        while let Some(chunk) = download.stream.next().await {
            received += chunk.unwrap().len();
        }
        assert_eq!(received, 2048);
    }

    #[tokio::test]
    async fn upload_sends_content_id_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/movies/upload"))
            .and(header("Content-Id", "42"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("42.mkv");
        tokio::fs::write(&file, b"encoded output").await.unwrap();

        MetadataService::upload(&client(&server).await, MediaKind::Movie, 42, &file)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn history_create_posts_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/encoding/history"))
            .respond_with(ResponseTemplate::new(200).set_body_json(5))
            .expect(1)
            .mount(&server)
            .await;

        let item = HistoryItem::new(42, MediaKind::Movie, "encoder-1", "Completed");
        let id = HistoryService::create(&client(&server).await, &item)
            .await
            .unwrap();
        assert_eq!(id, 5);
    }
}
