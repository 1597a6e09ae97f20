use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use imagegen_contracts::images::ParsedDataUrl;
use imagegen_contracts::{ImageGenError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// Standard alphabet, padding optional and non-zero trailing bits accepted:
/// providers are inconsistent about both.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

static DATA_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^data:([^;,]+)?(;base64)?,(.*)$").expect("data URL pattern compiles")
});

static DATA_URL_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^data:.*;base64,").expect("data URL header pattern compiles"));

/// Parses `data:[mime][;base64],<payload>`.
pub fn parse_data_url(data_url: &str) -> Result<ParsedDataUrl> {
    let captures = DATA_URL
        .captures(data_url)
        .ok_or(ImageGenError::InvalidDataUrl)?;
    let mime = captures.get(1).map(|m| m.as_str().to_string());
    let payload = captures.get(3).map(|m| m.as_str()).unwrap_or_default();

    let bytes = if captures.get(2).is_some() {
        decode_base64(payload)?
    } else {
        if has_malformed_escape(payload) {
            return Err(ImageGenError::processing(
                "Invalid percent-encoded data URL: malformed escape",
            ));
        }
        urlencoding::decode(payload)
            .map_err(|err| ImageGenError::processing_caused_by("Invalid percent-encoded data URL", err))?
            .into_owned()
            .into_bytes()
    };
    Ok(ParsedDataUrl { bytes, mime })
}

/// A `%` not followed by two hex digits.
fn has_malformed_escape(payload: &str) -> bool {
    let bytes = payload.as_bytes();
    bytes.iter().enumerate().any(|(idx, &byte)| {
        byte == b'%'
            && !(bytes.get(idx + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(idx + 2).is_some_and(u8::is_ascii_hexdigit))
    })
}

/// Decodes a bare base64 payload, dropping a stray `data:...;base64,` header if present.
pub fn decode_base64(payload: &str) -> Result<Vec<u8>> {
    let stripped = DATA_URL_HEADER.replace(payload, "");
    let compact: String = stripped
        .chars()
        .filter(|ch| !ch.is_ascii_whitespace())
        .collect();
    LENIENT_BASE64
        .decode(compact.as_bytes())
        .map_err(|err| ImageGenError::processing_caused_by("Invalid base64 image payload", err))
}
