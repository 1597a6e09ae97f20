use indexmap::IndexMap;

use crate::errors::{ImageGenError, Result};

pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash-image-preview";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub id: String,
    pub description: String,
}

/// Ordered allow-list of image models accepted by the generate tool.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelSpec>,
    default_model: String,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl ModelRegistry {
    pub fn new(models: Option<IndexMap<String, ModelSpec>>, default_model: Option<&str>) -> Self {
        let models = models.unwrap_or_else(default_models);
        let default_model = default_model
            .map(str::to_string)
            .or_else(|| {
                models
                    .contains_key(DEFAULT_MODEL)
                    .then(|| DEFAULT_MODEL.to_string())
            })
            .or_else(|| models.keys().next().cloned())
            .unwrap_or_default();
        Self {
            models,
            default_model,
        }
    }

    pub fn list(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models.values()
    }

    pub fn ids(&self) -> Vec<String> {
        self.models.keys().cloned().collect()
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn ensure(&self, id: &str) -> Result<&ModelSpec> {
        self.models
            .get(id)
            .ok_or_else(|| ImageGenError::ModelNotSupported {
                requested: id.to_string(),
                available: self.ids(),
            })
    }
}

fn default_models() -> IndexMap<String, ModelSpec> {
    let mut map = IndexMap::new();

    let mut insert = |id: &str, description: &str| {
        map.insert(
            id.to_string(),
            ModelSpec {
                id: id.to_string(),
                description: description.to_string(),
            },
        );
    };

    insert(
        "openai/gpt-5-image",
        "OpenAI GPT-5 Image: highest quality general-purpose image generation.",
    );
    insert(
        "openai/gpt-5-image-mini",
        "OpenAI GPT-5 Image Mini: faster, lower-cost variant with balanced quality.",
    );
    insert(
        "google/gemini-2.5-flash-image",
        "Google Gemini 2.5 Flash Image: fast Gemini image generation model.",
    );
    insert(
        "google/gemini-2.5-flash-image-preview",
        "Google Gemini 2.5 Flash Image Preview: latest Gemini preview image model.",
    );

    map
}
