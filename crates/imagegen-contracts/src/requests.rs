use serde::Deserialize;

use crate::errors::Result;
use crate::models::ModelRegistry;

pub const DEFAULT_FILENAME: &str = "generated_image";

/// Arguments of the generate tool exactly as a caller sent them.
///
/// Flags arrive either snake_case (tool schema) or camelCase (programmatic
/// callers); the snake_case spelling wins when both are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ImageGenerationRequest {
    pub prompt: String,
    pub model: Option<String>,
    pub save_to_file: Option<bool>,
    #[serde(rename = "saveToFile")]
    pub save_to_file_camel: Option<bool>,
    pub filename: Option<String>,
    pub show_full_response: Option<bool>,
    #[serde(rename = "showFullResponse")]
    pub show_full_response_camel: Option<bool>,
}

impl ImageGenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRequest {
    pub prompt: String,
    pub model: String,
    pub save_to_file: bool,
    pub filename: String,
    pub show_full_response: bool,
}

pub fn normalize_request(
    request: &ImageGenerationRequest,
    registry: &ModelRegistry,
) -> Result<NormalizedRequest> {
    let model = request
        .model
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(registry.default_model());
    let spec = registry.ensure(model)?;

    Ok(NormalizedRequest {
        prompt: request.prompt.clone(),
        model: spec.id.clone(),
        save_to_file: request
            .save_to_file
            .or(request.save_to_file_camel)
            .unwrap_or(false),
        filename: request
            .filename
            .clone()
            .unwrap_or_else(|| DEFAULT_FILENAME.to_string()),
        show_full_response: request
            .show_full_response
            .or(request.show_full_response_camel)
            .unwrap_or(false),
    })
}
