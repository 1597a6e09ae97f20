use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Extensions accepted when inferring a file type from a URL path.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "webp", "gif", "bmp", "tiff", "svg", "ico", "avif",
];

pub const FALLBACK_EXTENSION: &str = "png";

const MIME_EXTENSIONS: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/jpg", "jpg"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
    ("image/bmp", "bmp"),
    ("image/tiff", "tiff"),
    ("image/avif", "avif"),
    ("image/svg+xml", "svg"),
];

/// Maps a declared MIME type to a file extension. Parameters after `;` are ignored.
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    let essence = mime.split(';').next().unwrap_or_default().trim();
    MIME_EXTENSIONS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(essence))
        .map(|(_, ext)| *ext)
}

/// Normalizes a candidate extension against the allow-list; `jpeg` becomes `jpg`.
pub fn allowed_extension(candidate: &str) -> Option<&'static str> {
    let lowered = candidate.trim().to_ascii_lowercase();
    let ext = ALLOWED_EXTENSIONS
        .iter()
        .copied()
        .find(|known| *known == lowered)?;
    Some(if ext == "jpeg" { "jpg" } else { ext })
}

/// Raw image bytes as handed over by a provider or caller.
#[derive(Debug, Clone, PartialEq)]
pub enum RawBytes {
    Owned(Vec<u8>),
    Fixed(Box<[u8]>),
    /// Node-style `{"type": "Buffer", "data": [...]}` payloads.
    Buffer { data: Vec<u8> },
    Unsupported(Value),
}

impl RawBytes {
    pub fn from_value(value: Value) -> Self {
        if let Some(bytes) = value.as_array().and_then(|items| byte_array(items)) {
            return Self::Owned(bytes);
        }
        if let Some(bytes) = value
            .as_object()
            .and_then(|obj| obj.get("data"))
            .and_then(Value::as_array)
            .and_then(|items| byte_array(items))
        {
            return Self::Buffer { data: bytes };
        }
        Self::Unsupported(value)
    }
}

impl From<Vec<u8>> for RawBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Owned(bytes)
    }
}

impl<const N: usize> From<[u8; N]> for RawBytes {
    fn from(bytes: [u8; N]) -> Self {
        Self::Fixed(Box::new(bytes))
    }
}

impl<'de> Deserialize<'de> for RawBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

fn byte_array(items: &[Value]) -> Option<Vec<u8>> {
    items
        .iter()
        .map(|item| item.as_u64().and_then(|n| u8::try_from(n).ok()))
        .collect()
}

/// Loosely-typed description of one image, in any of the shapes providers return.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ImageDescriptor {
    pub url: Option<String>,
    #[serde(alias = "b64Json")]
    pub b64_json: Option<String>,
    pub base64: Option<String>,
    pub bytes: Option<RawBytes>,
    #[serde(rename = "mimeType", alias = "mime_type")]
    pub mime_type: Option<String>,
    #[serde(rename = "contentType", alias = "content_type")]
    pub content_type: Option<String>,
}

/// The single source a descriptor resolves from, after precedence is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageSource<'a> {
    Url(&'a str),
    Base64(&'a str),
    Bytes(&'a RawBytes),
}

impl ImageDescriptor {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn from_base64(payload: impl Into<String>) -> Self {
        Self {
            base64: Some(payload.into()),
            ..Self::default()
        }
    }

    pub fn from_bytes(bytes: impl Into<RawBytes>, mime_type: Option<&str>) -> Self {
        Self {
            bytes: Some(bytes.into()),
            mime_type: mime_type.map(str::to_string),
            ..Self::default()
        }
    }

    /// Picks the populated source: `url`, then `b64_json`, then `base64`, then `bytes`.
    pub fn source(&self) -> Option<ImageSource<'_>> {
        if let Some(url) = non_empty(self.url.as_deref()) {
            return Some(ImageSource::Url(url));
        }
        if let Some(payload) =
            non_empty(self.b64_json.as_deref()).or_else(|| non_empty(self.base64.as_deref()))
        {
            return Some(ImageSource::Base64(payload));
        }
        self.bytes.as_ref().map(ImageSource::Bytes)
    }

    pub fn mime_hint(&self) -> Option<&str> {
        non_empty(self.mime_type.as_deref()).or_else(|| non_empty(self.content_type.as_deref()))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDataUrl {
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
}
