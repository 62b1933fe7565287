//! Image resolution for scene export.
//!
//! `AssetResolver` owns the fetch concerns (HTTP client, `data:` URI
//! decoding, the shared image cache) so the scene stays a pure data model.
//!
//! Remote fetches are capped at [`MAX_ASSET_BYTES`] and refused for
//! loopback, private and link-local address literals and `localhost`, both
//! for the first request and for every redirect hop. Names that resolve to
//! such addresses are not caught here.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::DynamicImage;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::Scene;
use super::render::ImageMap;
use crate::error::MemoriaError;

/// Largest remote image body we read.
pub const MAX_ASSET_BYTES: usize = 16 * 1024 * 1024;

const MAX_REDIRECTS: usize = 5;

/// A decoded remote image with its last access time.
#[derive(Debug, Clone)]
pub struct CachedImage {
    pub image: DynamicImage,
    pub last_accessed: Instant,
}

impl CachedImage {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image,
            last_accessed: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_accessed = Instant::now();
    }
}

pub type ImageCache = Arc<RwLock<HashMap<String, CachedImage>>>;

#[derive(Clone)]
pub struct AssetResolver {
    http_client: reqwest::Client,
    cache: ImageCache,
}

impl AssetResolver {
    pub fn new(cache: ImageCache) -> Result<Self, MemoriaError> {
        let http_client = reqwest::Client::builder()
            .user_agent("memoria/0.1")
            .timeout(Duration::from_secs(20))
            .redirect(reqwest::redirect::Policy::custom(|attempt| {
                if attempt.previous().len() >= MAX_REDIRECTS {
                    attempt.error("too many redirects")
                } else if is_blocked_url(attempt.url()) {
                    attempt.error("redirect to a blocked host")
                } else {
                    attempt.follow()
                }
            }))
            .build()
            .map_err(|e| MemoriaError::Asset(format!("HTTP client error: {}", e)))?;
        Ok(Self::with_client(http_client, cache))
    }

    pub fn with_client(http_client: reqwest::Client, cache: ImageCache) -> Self {
        Self { http_client, cache }
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// Fetch and decode one image source.
    ///
    /// `data:` URIs are decoded in place and never cached. Remote images
    /// are served from the cache when present.
    pub async fn fetch(&self, url: &str) -> Result<DynamicImage, MemoriaError> {
        if url.starts_with("data:") {
            let bytes = decode_data_uri(url)?;
            return decode(&bytes);
        }

        let parsed = reqwest::Url::parse(url)
            .map_err(|e| MemoriaError::Asset(format!("invalid image URL {}: {}", url, e)))?;
        if is_blocked_url(&parsed) {
            return Err(MemoriaError::Asset(format!("blocked image host: {}", url)));
        }

        {
            let mut cache = self.cache.write().await;
            if let Some(entry) = cache.get_mut(url) {
                entry.touch();
                return Ok(entry.image.clone());
            }
        }

        let response = self
            .http_client
            .get(parsed)
            .send()
            .await
            .map_err(|e| MemoriaError::Asset(format!("Failed to download {}: {}", url, e)))?;
        if !response.status().is_success() {
            return Err(MemoriaError::Asset(format!(
                "Failed to download {}: HTTP {}",
                url,
                response.status()
            )));
        }
        let bytes = read_limited(response, MAX_ASSET_BYTES).await?;
        let image = decode(&bytes)?;

        debug!(url, width = image.width(), height = image.height(), "image cached");
        self.cache
            .write()
            .await
            .insert(url.to_string(), CachedImage::new(image.clone()));
        Ok(image)
    }

    /// Fetch every image the scene references.
    ///
    /// Failures are logged and left out of the map; the renderer draws a
    /// placeholder for them.
    pub async fn resolve(&self, scene: &Scene) -> ImageMap {
        let mut images = ImageMap::new();
        for url in scene.image_urls() {
            if images.contains_key(url) {
                continue;
            }
            match self.fetch(url).await {
                Ok(image) => {
                    images.insert(url.to_string(), image);
                }
                Err(e) => warn!(error = %e, "image unavailable, using placeholder"),
            }
        }
        images
    }

    /// Drop cache entries idle for at least `max_age`. Returns how many.
    pub async fn cleanup(&self, max_age: Duration) -> usize {
        let now = Instant::now();
        let mut cache = self.cache.write().await;
        let before = cache.len();
        cache.retain(|_, v| now.duration_since(v.last_accessed) < max_age);
        before - cache.len()
    }
}

/// Read a response body, failing once it passes `limit` bytes.
async fn read_limited(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, MemoriaError> {
    let too_large = || MemoriaError::Asset(format!("image larger than {} bytes", limit));
    if response
        .content_length()
        .is_some_and(|len| len > limit as u64)
    {
        return Err(too_large());
    }
    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| MemoriaError::Asset(format!("Failed to read image data: {}", e)))?
    {
        if body.len() + chunk.len() > limit {
            return Err(too_large());
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// True for non-HTTP URLs, `localhost`, and IP literals that are loopback,
/// private, link-local, unspecified or broadcast.
pub fn is_blocked_url(url: &reqwest::Url) -> bool {
    if !matches!(url.scheme(), "http" | "https") {
        return true;
    }
    let Some(host) = url.host_str() else {
        return true;
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.eq_ignore_ascii_case("localhost") || host.to_ascii_lowercase().ends_with(".localhost") {
        return true;
    }
    match host.parse::<IpAddr>() {
        Ok(ip) => is_internal(ip),
        Err(_) => false,
    }
}

fn is_internal(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
        }
        IpAddr::V6(v6) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return is_internal(IpAddr::V4(mapped));
            }
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                // fc00::/7 unique local, fe80::/10 link local
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80
        }
    }
}

fn decode(bytes: &[u8]) -> Result<DynamicImage, MemoriaError> {
    image::load_from_memory(bytes)
        .map_err(|e| MemoriaError::Asset(format!("Failed to decode image: {}", e)))
}

/// Decode the payload of a base64 `data:` URI.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, MemoriaError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| MemoriaError::Asset("not a data URI".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| MemoriaError::Asset("data URI has no payload".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(MemoriaError::Asset(
            "only base64 data URIs are supported".to_string(),
        ));
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|e| MemoriaError::Asset(format!("invalid base64 payload: {}", e)))
}

/// Encode image bytes as a `data:` URI.
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}
