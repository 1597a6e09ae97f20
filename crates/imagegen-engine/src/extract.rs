use imagegen_contracts::completions::ImageEntry;
use once_cell::sync::Lazy;
use regex::Regex;

static MARKDOWN_IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"!\[.*?\]\((https?://[^\s)]+)\)").expect("markdown image pattern compiles")
});

static BARE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://\S+").expect("bare URL pattern compiles"));

/// Finds the image reference in a generation response.
///
/// Order: first structured image entry, the whole text as an http(s) URL, the
/// whole text as an image data URL, a markdown image link, then the first bare
/// http(s) URL. `None` means the model produced no image, which is not an error.
pub fn extract_image_url(content: &str, images: Option<&[ImageEntry]>) -> Option<String> {
    if let Some(first) = images.and_then(|entries| entries.first()) {
        if let Some(url) = first
            .image_url
            .as_ref()
            .and_then(|image_url| image_url.url.as_deref())
            .filter(|url| !url.is_empty())
        {
            return Some(url.to_string());
        }
    }

    if content.starts_with("http://") || content.starts_with("https://") {
        return Some(content.to_string());
    }

    if content.starts_with("data:image") {
        return Some(content.to_string());
    }

    if let Some(url) = MARKDOWN_IMAGE
        .captures(content)
        .and_then(|captures| captures.get(1))
    {
        return Some(url.as_str().to_string());
    }

    BARE_URL.find(content).map(|url| url.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use imagegen_contracts::completions::{ChatCompletion, ImageEntry};
    use serde_json::json;

    use super::extract_image_url;

    #[test]
    fn structured_images_take_precedence() {
        let images = vec![ImageEntry::url("https://x/y.png"), ImageEntry::url("https://x/z.png")];
        assert_eq!(
            extract_image_url("see https://other/url.png", Some(images.as_slice())),
            Some("https://x/y.png".to_string())
        );
        assert_eq!(
            extract_image_url("", Some(images.as_slice())),
            Some("https://x/y.png".to_string())
        );
    }

    #[test]
    fn empty_structured_list_and_text_yield_none() {
        assert_eq!(extract_image_url("", Some(&[][..])), None);
        assert_eq!(extract_image_url("", None), None);
        assert_eq!(extract_image_url("I cannot draw that.", None), None);
    }

    #[test]
    fn entry_without_url_falls_through_to_text() {
        let images = vec![ImageEntry::default()];
        assert_eq!(
            extract_image_url("https://cdn/img.webp", Some(images.as_slice())),
            Some("https://cdn/img.webp".to_string())
        );
    }

    #[test]
    fn deserialized_entry_without_url_falls_through_to_text() -> anyhow::Result<()> {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "choices": [{"message": {
                "content": "https://cdn/x.png",
                "images": [{"image_url": {}}]
            }}]
        }))?;
        assert_eq!(
            extract_image_url(completion.content(), Some(completion.images())),
            Some("https://cdn/x.png".to_string())
        );

        let null_url: ChatCompletion = serde_json::from_value(json!({
            "choices": [{"message": {"content": "", "images": [{"image_url": {"url": null}}]}}]
        }))?;
        assert_eq!(
            extract_image_url(null_url.content(), Some(null_url.images())),
            None
        );
        Ok(())
    }

    #[test]
    fn whole_text_url_is_returned_verbatim() {
        assert_eq!(
            extract_image_url("https://x/y.png trailing", None),
            Some("https://x/y.png trailing".to_string())
        );
        assert_eq!(
            extract_image_url("data:image/png;base64,AAAA", None),
            Some("data:image/png;base64,AAAA".to_string())
        );
    }

    #[test]
    fn markdown_image_is_extracted() {
        assert_eq!(
            extract_image_url("Here: ![a](https://x/y.png)", None),
            Some("https://x/y.png".to_string())
        );
    }

    #[test]
    fn markdown_wins_over_earlier_bare_url() {
        assert_eq!(
            extract_image_url(
                "Docs at https://docs/page then ![img](https://cdn/pic.png)",
                None
            ),
            Some("https://cdn/pic.png".to_string())
        );
    }

    #[test]
    fn bare_url_stops_at_whitespace() {
        assert_eq!(
            extract_image_url("Your image: https://cdn/a.png enjoy", None),
            Some("https://cdn/a.png".to_string())
        );
    }
}
