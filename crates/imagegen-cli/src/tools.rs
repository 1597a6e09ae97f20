use imagegen_contracts::models::ModelRegistry;
use serde_json::{json, Value};

pub const GENERATE_IMAGE: &str = "generate_image";
pub const LIST_MODELS: &str = "list_models";

/// Tool descriptors advertised by `tools/list`.
pub fn tool_schemas(registry: &ModelRegistry) -> Value {
    let ids = registry.ids();
    let default_model = registry.default_model();
    json!([
        {
            "name": GENERATE_IMAGE,
            "description": "Generate images via OpenRouter using configurable models (OpenAI GPT-5 Image, GPT-5 Image Mini, Gemini Flash Image, Gemini Flash Image Preview).",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "prompt": {
                        "type": "string",
                        "description": "Text description of the image to generate. Include style details (e.g., \"photorealistic\", \"oil painting\"), aspect ratio (e.g., \"square image\", \"landscape\"), and composition details directly in the prompt.",
                    },
                    "model": {
                        "type": "string",
                        "description": format!(
                            "Optional model ID. Defaults to {default_model}. Available models: {}",
                            ids.join(", ")
                        ),
                        "enum": ids,
                        "default": default_model,
                    },
                    "save_to_file": {
                        "type": "boolean",
                        "description": "Save generated image to local file",
                        "default": false,
                    },
                    "filename": {
                        "type": "string",
                        "description": "Base filename for saved image (without extension)",
                    },
                    "show_full_response": {
                        "type": "boolean",
                        "description": "Show full response including base64 data (default: false)",
                        "default": false,
                    },
                },
                "required": ["prompt"],
            },
        },
        {
            "name": LIST_MODELS,
            "description": "List available OpenRouter image generation models and their descriptions.",
            "inputSchema": {
                "type": "object",
                "properties": {},
            },
        },
    ])
}

pub fn text_content(text: impl Into<String>) -> Value {
    json!({
        "content": [{"type": "text", "text": text.into()}],
    })
}

#[cfg(test)]
mod tests {
    use imagegen_contracts::models::ModelRegistry;

    use super::{text_content, tool_schemas};

    #[test]
    fn generate_image_schema_enumerates_models() {
        let registry = ModelRegistry::default();
        let tools = tool_schemas(&registry);
        assert_eq!(tools[0]["name"], "generate_image");
        assert_eq!(tools[0]["inputSchema"]["required"][0], "prompt");
        let model = &tools[0]["inputSchema"]["properties"]["model"];
        assert_eq!(model["default"], "google/gemini-2.5-flash-image-preview");
        assert_eq!(model["enum"].as_array().map(Vec::len), Some(4));
        assert_eq!(tools[1]["name"], "list_models");
    }

    #[test]
    fn text_content_wraps_single_block() {
        let value = text_content("hello");
        assert_eq!(value["content"][0]["type"], "text");
        assert_eq!(value["content"][0]["text"], "hello");
    }
}
