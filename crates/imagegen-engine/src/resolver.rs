use std::path::Path;

use imagegen_contracts::images::{
    allowed_extension, extension_for_mime, ImageDescriptor, ImageSource, RawBytes, ResolvedImage,
    FALLBACK_EXTENSION,
};
use imagegen_contracts::{ImageGenError, Result};
use tracing::debug;

use crate::data_url::{decode_base64, parse_data_url};
use crate::fetch::ImageFetcher;

/// Bytes pulled from one source, before the extension is settled.
struct ExtractedImage {
    bytes: Vec<u8>,
    mime: Option<String>,
    candidate_extension: Option<&'static str>,
}

/// Turns any [`ImageDescriptor`] into bytes plus a file extension.
pub struct ImageResolver {
    fetcher: Box<dyn ImageFetcher>,
}

impl ImageResolver {
    pub fn new(fetcher: Box<dyn ImageFetcher>) -> Self {
        Self { fetcher }
    }

    pub fn resolve(&self, descriptor: &ImageDescriptor) -> Result<ResolvedImage> {
        self.resolve_unwrapped(descriptor).map_err(|err| {
            if err.is_resolver_kind() {
                err
            } else {
                ImageGenError::processing_caused_by("Failed to resolve image", err)
            }
        })
    }

    fn resolve_unwrapped(&self, descriptor: &ImageDescriptor) -> Result<ResolvedImage> {
        let source = descriptor.source().ok_or(ImageGenError::NoImageData)?;
        let extracted = match source {
            ImageSource::Url(url) => self.extract_from_url(url)?,
            ImageSource::Base64(payload) => ExtractedImage {
                bytes: decode_base64(payload)?,
                mime: descriptor.mime_hint().map(str::to_string),
                candidate_extension: None,
            },
            ImageSource::Bytes(raw) => ExtractedImage {
                bytes: coerce_bytes(raw)?,
                mime: descriptor.mime_hint().map(str::to_string),
                candidate_extension: None,
            },
        };
        if extracted.bytes.is_empty() {
            return Err(ImageGenError::NoImageData);
        }

        let extension =
            resolve_extension(extracted.mime.as_deref(), extracted.candidate_extension);
        Ok(ResolvedImage {
            bytes: extracted.bytes,
            extension,
        })
    }

    fn extract_from_url(&self, url: &str) -> Result<ExtractedImage> {
        if url.starts_with("data:") {
            let parsed = parse_data_url(url)?;
            return Ok(ExtractedImage {
                bytes: parsed.bytes,
                mime: parsed.mime,
                candidate_extension: None,
            });
        }

        debug!("fetching remote image {url}");
        let fetched = self.fetcher.fetch(url)?;
        if !fetched.is_success() {
            return Err(ImageGenError::ImageProcessing {
                message: format!("Failed to fetch image from {url}: HTTP {}", fetched.status),
                status: Some(fetched.status),
                source: None,
            });
        }
        Ok(ExtractedImage {
            bytes: fetched.bytes,
            mime: fetched.content_type,
            candidate_extension: extension_from_url(url),
        })
    }
}

/// MIME mapping first, then the source's own candidate, then `png`.
pub fn resolve_extension(mime: Option<&str>, candidate: Option<&'static str>) -> &'static str {
    mime.and_then(extension_for_mime)
        .or(candidate)
        .unwrap_or(FALLBACK_EXTENSION)
}

/// Extension of the URL path, if it is one of the allowed image extensions.
pub fn extension_from_url(raw: &str) -> Option<&'static str> {
    let parsed = url::Url::parse(raw).ok()?;
    let ext = Path::new(parsed.path()).extension()?.to_str()?;
    allowed_extension(ext)
}

fn coerce_bytes(raw: &RawBytes) -> Result<Vec<u8>> {
    match raw {
        RawBytes::Owned(bytes) => Ok(bytes.clone()),
        RawBytes::Fixed(bytes) => Ok(bytes.to_vec()),
        RawBytes::Buffer { data } => Ok(data.clone()),
        RawBytes::Unsupported(_) => Err(ImageGenError::UnsupportedBytesFormat),
    }
}
