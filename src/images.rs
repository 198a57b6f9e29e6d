//! Image loading for sprite locators
//!
//! An image counts as loaded once its bytes were downloaded and decoded.

use crate::config::LookupConfig;
use crate::error::{ApiError, ApiResult};
use reqwest::Url;
use std::fmt;

/// A decoded image, ready to display
#[derive(Clone)]
pub struct LoadedImage {
    /// Locator the image was loaded from, unchanged
    pub src: String,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for LoadedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedImage")
            .field("src", &self.src)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Downloads and decodes images
#[derive(Debug, Clone)]
pub struct ImageLoader {
    client: reqwest::Client,
}

impl ImageLoader {
    pub fn new(config: &LookupConfig) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Fetch image bytes from a URL
    pub async fn fetch_image(&self, url: &str) -> ApiResult<Vec<u8>> {
        let url = Url::parse(url).map_err(|_| ApiError::InvalidLocator(url.to_string()))?;

        log::debug!("Fetching image: {}", url);

        let response = self.client.get(url).send().await?;

        if response.status().is_success() {
            Ok(response.bytes().await?.to_vec())
        } else {
            Err(ApiError::HttpStatus(response.status()))
        }
    }

    /// Fetch and decode the image at `src`
    pub async fn load(&self, src: &str) -> ApiResult<LoadedImage> {
        let bytes = self.fetch_image(src).await?;
        let (width, height) = decode_dimensions(&bytes)?;

        log::debug!("Loaded image {} ({}x{})", src, width, height);

        Ok(LoadedImage {
            src: src.to_string(),
            width,
            height,
            bytes,
        })
    }
}

/// Decode image bytes and return their dimensions
pub fn decode_dimensions(bytes: &[u8]) -> ApiResult<(u32, u32)> {
    let decoded = image::load_from_memory(bytes).map_err(|e| ApiError::Image(e.to_string()))?;
    Ok((decoded.width(), decoded.height()))
}
