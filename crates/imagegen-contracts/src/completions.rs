//! Wire shape of an OpenRouter chat-completion response, reduced to what image
//! generation reads.

use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChatCompletion {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Choice {
    pub message: AssistantMessage,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AssistantMessage {
    pub content: Option<String>,
    pub images: Option<Vec<ImageEntry>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ImageEntry {
    pub image_url: Option<ImageUrl>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ImageUrl {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Usage {
    pub total_tokens: Option<u64>,
}

impl ChatCompletion {
    fn first_message(&self) -> Option<&AssistantMessage> {
        self.choices.first().map(|choice| &choice.message)
    }

    /// Assistant text of the first choice, empty when missing.
    pub fn content(&self) -> &str {
        self.first_message()
            .and_then(|message| message.content.as_deref())
            .unwrap_or_default()
    }

    pub fn images(&self) -> &[ImageEntry] {
        self.first_message()
            .and_then(|message| message.images.as_deref())
            .unwrap_or_default()
    }
}

impl ImageEntry {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            image_url: Some(ImageUrl {
                url: Some(url.into()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::ChatCompletion;

    #[test]
    fn reads_content_images_and_usage() -> anyhow::Result<()> {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "id": "gen-1",
            "choices": [{
                "finish_reason": "stop",
                "message": {
                    "role": "assistant",
                    "content": "Here you go",
                    "images": [{"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}}]
                }
            }],
            "usage": {"prompt_tokens": 3, "total_tokens": 1290}
        }))?;
        assert_eq!(completion.content(), "Here you go");
        assert_eq!(completion.images().len(), 1);
        assert_eq!(
            completion.images()[0].image_url.as_ref().and_then(|u| u.url.as_deref()),
            Some("data:image/png;base64,AAAA")
        );
        assert_eq!(completion.usage.and_then(|u| u.total_tokens), Some(1290));
        Ok(())
    }

    #[test]
    fn tolerates_missing_fields() -> anyhow::Result<()> {
        let completion: ChatCompletion =
            serde_json::from_value(json!({"choices": [{"message": {"content": null}}]}))?;
        assert_eq!(completion.content(), "");
        assert!(completion.images().is_empty());
        assert!(completion.usage.is_none());

        let empty: ChatCompletion = serde_json::from_value(json!({}))?;
        assert_eq!(empty.content(), "");
        Ok(())
    }

    #[test]
    fn image_entry_without_url_still_parses() -> anyhow::Result<()> {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "choices": [{"message": {
                "content": "https://cdn/x.png",
                "images": [{"image_url": {}}, {"image_url": {"url": null}}]
            }}]
        }))?;
        assert_eq!(completion.images().len(), 2);
        assert!(completion
            .images()
            .iter()
            .all(|entry| entry.image_url.as_ref().and_then(|u| u.url.as_ref()).is_none()));
        Ok(())
    }
}
