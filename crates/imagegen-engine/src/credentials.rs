//! Shape checks for the OpenRouter API key.

use imagegen_contracts::{ImageGenError, Result};
use tracing::warn;

use crate::config::API_KEY_ENV;

pub const MIN_KEY_LENGTH: usize = 20;
pub const EXPECTED_KEY_PREFIX: &str = "sk-or-";

const MASK_MIN_LENGTH: usize = 14;
const MASK_NOT_SET: &str = "[NOT SET]";
const MASK_TOO_SHORT: &str = "[TOO SHORT]";

/// Validates presence and length of the key and returns it.
///
/// A key without the usual prefix only produces a warning; the prefix
/// convention can change without invalidating existing keys.
pub fn validate_api_key(api_key: Option<&str>) -> Result<&str> {
    let Some(key) = api_key.filter(|key| !key.is_empty()) else {
        return Err(ImageGenError::MissingCredential {
            var: API_KEY_ENV.to_string(),
        });
    };
    if key.chars().count() < MIN_KEY_LENGTH {
        return Err(ImageGenError::CredentialTooShort {
            var: API_KEY_ENV.to_string(),
            min_len: MIN_KEY_LENGTH,
        });
    }
    if !key.starts_with(EXPECTED_KEY_PREFIX) {
        warn!(
            "OpenRouter API keys typically start with \"{EXPECTED_KEY_PREFIX}\"; your key may be invalid"
        );
    }
    Ok(key)
}

/// Display form of a key: first 10 and last 4 characters only.
pub fn mask_api_key(api_key: Option<&str>) -> String {
    let Some(key) = api_key.filter(|key| !key.is_empty()) else {
        return MASK_NOT_SET.to_string();
    };
    let chars: Vec<char> = key.chars().collect();
    if chars.len() < MASK_MIN_LENGTH {
        return MASK_TOO_SHORT.to_string();
    }
    let head: String = chars[..10].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
