use imagegen_contracts::completions::ChatCompletion;
use imagegen_contracts::models::ModelRegistry;
use imagegen_contracts::responses::{ImageInfo, ResponseEnvelope, TokenUsage};

const DEFAULT_MESSAGE: &str = "Image generated successfully";
const DATA_IMAGE_PREFIX: &str = "data:image/";

pub struct EnvelopeParams<'a> {
    pub prompt: &'a str,
    pub model: &'a str,
    pub image_url: Option<&'a str>,
    pub saved_file: Option<&'a str>,
    pub completion: &'a ChatCompletion,
    pub show_full_response: bool,
}

pub fn format_envelope(params: EnvelopeParams<'_>) -> ResponseEnvelope {
    let content = params.completion.content();
    ResponseEnvelope {
        success: true,
        model: params.model.to_string(),
        prompt: params.prompt.to_string(),
        message: if content.is_empty() {
            DEFAULT_MESSAGE.to_string()
        } else {
            content.to_string()
        },
        image: params
            .image_url
            .filter(|url| !url.is_empty())
            .map(|url| image_info(url, params.show_full_response)),
        saved_to: params
            .saved_file
            .filter(|path| !path.is_empty())
            .map(str::to_string),
        usage: params.completion.usage.as_ref().map(|usage| TokenUsage {
            tokens: usage.total_tokens.unwrap_or(0),
        }),
    }
}

fn image_info(image_url: &str, show_full_response: bool) -> ImageInfo {
    if !image_url.starts_with("data:image") {
        return ImageInfo::Url {
            url: image_url.to_string(),
        };
    }
    let size_kb = (image_url.len() as f64 / 1024.0).round() as u64;
    ImageInfo::Base64 {
        data: show_full_response.then(|| image_url.to_string()),
        size: format!("{size_kb}KB"),
        format: data_url_format(image_url),
    }
}

/// Subtype between `data:image/` and the first `;` or `,`.
fn data_url_format(data_url: &str) -> String {
    let format = data_url
        .strip_prefix(DATA_IMAGE_PREFIX)
        .and_then(|rest| rest.split([';', ',']).next())
        .unwrap_or_default();
    if format.is_empty() {
        "unknown".to_string()
    } else {
        format.to_string()
    }
}

pub fn format_model_list(registry: &ModelRegistry) -> String {
    let models = registry
        .list()
        .map(|model| format!("• {}\n  {}", model.id, model.description))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Available OpenRouter Image Generation Models:
{models}

Default model: {default}

Notes:
• Control image style, aspect ratio, and composition directly in your prompt.
• Specify the optional \"model\" parameter when calling generate_image to switch models.
• Save results locally by setting \"save_to_file\" to true and providing a \"filename\".

Examples:
• For multiple images: \"Generate 3 variations of...\" (note: model may not always follow exact count)
• For square images: Include \"square image\" in your prompt
• For landscape: Include \"landscape orientation\" or \"16:9 aspect ratio\"
• For portrait: Include \"portrait orientation\" or \"9:16 aspect ratio\"
• For specific styles: \"photorealistic\", \"oil painting\", \"watercolor\", \"digital art\", etc.
• For quality: \"ultra HD\", \"4K\", \"highly detailed\", etc.

The model interprets your natural language description to generate images matching your requirements.",
        default = registry.default_model(),
    )
}
