//! Image payload loading from data URIs, remote URLs, or local files.
//!
//! DESIGN
//! ======
//! Items and backgrounds carry an opaque payload string. The export pipeline
//! only needs "payload in, RGBA pixels out", expressed as the [`ImageLoader`]
//! trait so tests can substitute in-memory fixtures. [`PayloadLoader`] is the
//! production implementation. Decoding runs on the blocking pool so large
//! images never stall the runtime, and every load the pipeline issues is
//! wrapped in a bounded wait ([`load_with_timeout`]).

#[cfg(test)]
#[path = "loader_test.rs"]
mod loader_test;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::RgbaImage;

use crate::config::ExportConfig;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("malformed data URI")]
    InvalidDataUri,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("fetch failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image has no pixels")]
    EmptyImage,
    /// Nothing to load. Custom loaders return this for unknown payloads.
    #[error("no image for payload {0}")]
    Unavailable(String),
    #[error("image too large to rasterize ({width}x{height})")]
    TooLarge { width: u32, height: u32 },
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("decoder task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A decoded, non-empty RGBA image.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pixels: RgbaImage,
}

impl DecodedImage {
    /// Wrap decoded pixels.
    ///
    /// # Errors
    ///
    /// Returns `EmptyImage` if either dimension is zero.
    pub fn new(pixels: RgbaImage) -> Result<Self, LoadError> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(LoadError::EmptyImage);
        }
        Ok(Self { pixels })
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// `height / width` of the natural image.
    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.height()) / f64::from(self.width())
    }

    #[must_use]
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Where a payload string points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSource {
    /// Inline `data:` URI.
    DataUri,
    /// `http://` or `https://` URL.
    Remote,
    /// Anything else is read as a local path.
    File,
}

impl PayloadSource {
    #[must_use]
    pub fn classify(payload: &str) -> Self {
        let lower = payload.get(..8).unwrap_or(payload).to_ascii_lowercase();
        if lower.starts_with("data:") {
            Self::DataUri
        } else if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Remote
        } else {
            Self::File
        }
    }
}

/// Turns a payload string into decoded pixels.
#[async_trait::async_trait]
pub trait ImageLoader: Send + Sync {
    /// Fetch and decode one payload.
    async fn load(&self, payload: &str) -> Result<DecodedImage, LoadError>;
}

// =============================================================================
// PAYLOAD LOADER
// =============================================================================

/// Production loader for data URIs, remote URLs, and local files.
#[derive(Debug, Clone)]
pub struct PayloadLoader {
    http: reqwest::Client,
}

impl PayloadLoader {
    /// Build a loader whose HTTP client honors the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns `Http` if the HTTP client cannot be constructed.
    pub fn new(config: &ExportConfig) -> Result<Self, LoadError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.decode_timeout)
            .build()?;
        Ok(Self { http })
    }

    async fn fetch_bytes(&self, payload: &str) -> Result<Vec<u8>, LoadError> {
        if payload.trim().is_empty() {
            return Err(LoadError::Unavailable("<blank>".to_string()));
        }
        match PayloadSource::classify(payload) {
            PayloadSource::DataUri => decode_data_uri(payload),
            PayloadSource::Remote => {
                let response = self.http.get(payload).send().await?.error_for_status()?;
                Ok(response.bytes().await?.to_vec())
            }
            PayloadSource::File => Ok(tokio::fs::read(payload).await?),
        }
    }
}

#[async_trait::async_trait]
impl ImageLoader for PayloadLoader {
    async fn load(&self, payload: &str) -> Result<DecodedImage, LoadError> {
        let bytes = self.fetch_bytes(payload).await?;
        decode_bytes(bytes).await
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Extract the body of a `data:` URI.
///
/// Base64 bodies (`;base64` in the metadata) are decoded; whitespace inside
/// them is ignored. Other bodies are returned as raw bytes.
///
/// # Errors
///
/// Returns `InvalidDataUri` when the prefix or comma separator is missing, and
/// `Base64` when a base64 body is malformed.
pub fn decode_data_uri(payload: &str) -> Result<Vec<u8>, LoadError> {
    let rest = payload
        .get(..5)
        .filter(|scheme| scheme.eq_ignore_ascii_case("data:"))
        .and_then(|_| payload.get(5..))
        .ok_or(LoadError::InvalidDataUri)?;
    let (meta, body) = rest.split_once(',').ok_or(LoadError::InvalidDataUri)?;

    if meta.split(';').any(|part| part.trim().eq_ignore_ascii_case("base64")) {
        let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        Ok(STANDARD.decode(compact)?)
    } else {
        Ok(body.as_bytes().to_vec())
    }
}

/// Decode encoded image bytes on the blocking pool.
///
/// If the caller stops waiting (for example, [`load_with_timeout`] expires)
/// before the blocking task starts, the decode is skipped. A decode that has
/// already started runs to completion and its result is dropped.
///
/// # Errors
///
/// Returns `Decode` for unsupported or corrupt data and `EmptyImage` for a
/// zero-sized result.
pub async fn decode_bytes(bytes: Vec<u8>) -> Result<DecodedImage, LoadError> {
    let abandoned = Arc::new(AtomicBool::new(false));
    let _waiter = AbandonOnDrop(Arc::clone(&abandoned));
    let pixels = tokio::task::spawn_blocking(move || decode_unless_abandoned(&bytes, &abandoned)).await??;
    DecodedImage::new(pixels)
}

/// Marks a pending decode as unwanted when the awaiting future is dropped.
struct AbandonOnDrop(Arc<AtomicBool>);

impl Drop for AbandonOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

fn decode_unless_abandoned(bytes: &[u8], abandoned: &AtomicBool) -> Result<RgbaImage, LoadError> {
    if abandoned.load(Ordering::Acquire) {
        return Err(LoadError::Unavailable("decode abandoned".to_string()));
    }
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// Run `loader` for `payload`, giving up after `timeout`.
///
/// # Errors
///
/// Returns the loader's error, or `Timeout` when the wait expires.
pub async fn load_with_timeout(
    loader: &dyn ImageLoader,
    payload: &str,
    timeout: Duration,
) -> Result<DecodedImage, LoadError> {
    match tokio::time::timeout(timeout, loader.load(payload)).await {
        Ok(result) => result,
        Err(_elapsed) => Err(LoadError::Timeout(timeout)),
    }
}
