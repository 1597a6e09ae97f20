use std::sync::Arc;
use std::time::Duration;

use imagegen_contracts::{ImageGenError, Result};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::CONTENT_TYPE;

/// Raw outcome of a GET on an image URL; status policy belongs to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub status: u16,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FetchedImage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<FetchedImage>;
}

impl<T: ImageFetcher + ?Sized> ImageFetcher for Arc<T> {
    fn fetch(&self, url: &str) -> Result<FetchedImage> {
        self.as_ref().fetch(url)
    }
}

pub struct HttpImageFetcher {
    http: HttpClient,
    timeout: Duration,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http: HttpClient::new(),
            timeout,
        }
    }
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedImage> {
        let response = self
            .http
            .get(url)
            .timeout(self.timeout)
            .send()
            .map_err(|err| {
                ImageGenError::processing_caused_by(
                    format!("Failed to fetch image from URL: {url}"),
                    err,
                )
            })?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .map_err(|err| {
                ImageGenError::processing_caused_by(
                    format!("Failed reading image bytes from {url}"),
                    err,
                )
            })?
            .to_vec();
        Ok(FetchedImage {
            status,
            content_type,
            bytes,
        })
    }
}
