//! Stock footage search (Pexels, Pixabay).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::error::{check_status, AiResult};

/// A downloadable stock clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockCandidate {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

impl StockCandidate {
    pub fn pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Sort candidates by resolution, largest first (stable for ties).
pub fn sort_by_resolution(candidates: &mut [StockCandidate]) {
    candidates.sort_by(|a, b| b.pixels().cmp(&a.pixels()));
}

/// A stock footage search service.
#[async_trait]
pub trait StockProvider: Send + Sync {
    /// Provider name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Search for clips; results come back sorted by resolution, descending.
    async fn search(&self, query: &str, per_page: u32) -> AiResult<Vec<StockCandidate>>;
}

#[async_trait]
impl<T: StockProvider + ?Sized> StockProvider for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn search(&self, query: &str, per_page: u32) -> AiResult<Vec<StockCandidate>> {
        (**self).search(query, per_page).await
    }
}

// ---------------------------------------------------------------------------
// Pexels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PexelsConfig {
    pub api_key: String,
    pub base_url: String,
}

impl PexelsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.pexels.com".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct PexelsResponse {
    #[serde(default)]
    videos: Vec<PexelsVideo>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideo {
    #[serde(default)]
    video_files: Vec<PexelsVideoFile>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideoFile {
    link: String,
    width: Option<u32>,
    height: Option<u32>,
}

pub struct PexelsClient {
    http: Client,
    config: PexelsConfig,
}

impl PexelsClient {
    pub fn new(http: Client, config: PexelsConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl StockProvider for PexelsClient {
    fn name(&self) -> &'static str {
        "pexels"
    }

    async fn search(&self, query: &str, per_page: u32) -> AiResult<Vec<StockCandidate>> {
        let url = format!("{}/videos/search", self.config.base_url.trim_end_matches('/'));
        let response = self
            .http
            .get(&url)
            .header("Authorization", &self.config.api_key)
            .query(&[("query", query.to_string()), ("per_page", per_page.to_string())])
            .send()
            .await?;
        let body: PexelsResponse = check_status("pexels", response).await?.json().await?;

        // Largest rendition of each video
        let mut candidates: Vec<StockCandidate> = body
            .videos
            .into_iter()
            .filter_map(|video| {
                video
                    .video_files
                    .into_iter()
                    .filter(|f| !f.link.is_empty())
                    .max_by_key(|f| f.width.unwrap_or(0))
                    .map(|f| StockCandidate {
                        url: f.link,
                        width: f.width.unwrap_or(0),
                        height: f.height.unwrap_or(0),
                    })
            })
            .collect();
        sort_by_resolution(&mut candidates);

        debug!(provider = "pexels", query, results = candidates.len(), "Stock search complete");
        Ok(candidates)
    }
}

// ---------------------------------------------------------------------------
// Pixabay
// ---------------------------------------------------------------------------

/// Pixabay rejects page sizes outside this range.
const PIXABAY_PER_PAGE_RANGE: (u32, u32) = (3, 200);

#[derive(Debug, Clone)]
pub struct PixabayConfig {
    pub api_key: String,
    pub base_url: String,
}

impl PixabayConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://pixabay.com".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct PixabayResponse {
    #[serde(default)]
    hits: Vec<PixabayHit>,
}

#[derive(Debug, Deserialize)]
struct PixabayHit {
    #[serde(default)]
    videos: PixabayRenditions,
}

#[derive(Debug, Default, Deserialize)]
struct PixabayRenditions {
    large: Option<PixabayRendition>,
    medium: Option<PixabayRendition>,
}

#[derive(Debug, Deserialize)]
struct PixabayRendition {
    #[serde(default)]
    url: String,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
}

pub struct PixabayClient {
    http: Client,
    config: PixabayConfig,
}

impl PixabayClient {
    pub fn new(http: Client, config: PixabayConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl StockProvider for PixabayClient {
    fn name(&self) -> &'static str {
        "pixabay"
    }

    async fn search(&self, query: &str, per_page: u32) -> AiResult<Vec<StockCandidate>> {
        let url = format!("{}/api/videos/", self.config.base_url.trim_end_matches('/'));
        let page_size = per_page.clamp(PIXABAY_PER_PAGE_RANGE.0, PIXABAY_PER_PAGE_RANGE.1);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("key", self.config.api_key.clone()),
                ("q", query.to_string()),
                ("per_page", page_size.to_string()),
            ])
            .send()
            .await?;
        let body: PixabayResponse = check_status("pixabay", response).await?.json().await?;

        // Large rendition when present, medium otherwise
        let mut candidates: Vec<StockCandidate> = body
            .hits
            .into_iter()
            .filter_map(|hit| {
                let PixabayRenditions { large, medium } = hit.videos;
                large
                    .filter(|r| !r.url.is_empty())
                    .or(medium.filter(|r| !r.url.is_empty()))
                    .map(|r| StockCandidate {
                        url: r.url,
                        width: r.width,
                        height: r.height,
                    })
            })
            .take(per_page as usize)
            .collect();
        sort_by_resolution(&mut candidates);

        debug!(provider = "pixabay", query, results = candidates.len(), "Stock search complete");
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::http_client;
    use crate::error::AiError;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_pexels_picks_widest_file_and_sorts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos/search"))
            .and(header("Authorization", "pexels-key"))
            .and(query_param("query", "Nature cat sleeps"))
            .and(query_param("per_page", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "videos": [
                    {"video_files": [
                        {"link": "https://cdn/a-sd.mp4", "width": 640, "height": 360},
                        {"link": "https://cdn/a-hd.mp4", "width": 1280, "height": 720}
                    ]},
                    {"video_files": [
                        {"link": "https://cdn/b-4k.mp4", "width": 3840, "height": 2160}
                    ]},
                    {"video_files": []}
                ]
            })))
            .mount(&server)
            .await;

        let client = PexelsClient::new(
            http_client().unwrap(),
            PexelsConfig::new("pexels-key").with_base_url(server.uri()),
        );
        let results = client.search("Nature cat sleeps", 3).await.unwrap();

        let urls: Vec<_> = results.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(urls, vec!["https://cdn/b-4k.mp4", "https://cdn/a-hd.mp4"]);
    }

    #[tokio::test]
    async fn test_pexels_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let client = PexelsClient::new(
            http_client().unwrap(),
            PexelsConfig::new("wrong").with_base_url(server.uri()),
        );
        let err = client.search("x", 3).await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert!(matches!(err, AiError::RequestFailed { service: "pexels", .. }));
    }

    #[tokio::test]
    async fn test_pixabay_prefers_large_then_medium() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/videos/"))
            .and(query_param("key", "pixabay-key"))
            .and(query_param("q", "Nature dog runs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hits": [
                    {"videos": {
                        "large": {"url": "", "width": 0, "height": 0},
                        "medium": {"url": "https://cdn/m.mp4", "width": 1280, "height": 720}
                    }},
                    {"videos": {
                        "large": {"url": "https://cdn/l.mp4", "width": 1920, "height": 1080},
                        "medium": {"url": "https://cdn/l-m.mp4", "width": 1280, "height": 720}
                    }},
                    {"videos": {}}
                ]
            })))
            .mount(&server)
            .await;

        let client = PixabayClient::new(
            http_client().unwrap(),
            PixabayConfig::new("pixabay-key").with_base_url(server.uri()),
        );
        let results = client.search("Nature dog runs", 3).await.unwrap();

        let urls: Vec<_> = results.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(urls, vec!["https://cdn/l.mp4", "https://cdn/m.mp4"]);
    }

    #[test]
    fn test_sort_by_resolution_is_stable() {
        let mut candidates = vec![
            StockCandidate { url: "a".into(), width: 1280, height: 720 },
            StockCandidate { url: "b".into(), width: 1920, height: 1080 },
            StockCandidate { url: "c".into(), width: 1280, height: 720 },
        ];
        sort_by_resolution(&mut candidates);
        let urls: Vec<_> = candidates.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(urls, vec!["b", "a", "c"]);
    }
}
