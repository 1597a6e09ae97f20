use std::time::Duration;

use imagegen_contracts::completions::ChatCompletion;
use imagegen_contracts::{ImageGenError, Result};
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use reqwest::header::CONTENT_TYPE;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::{EngineConfig, API_KEY_ENV};

/// Remote text-to-image call: one user prompt in, one chat completion out.
pub trait GenerationBackend: Send + Sync {
    fn generate(&self, api_key: &str, prompt: &str, model: &str) -> Result<ChatCompletion>;
}

pub struct OpenRouterClient {
    api_base: String,
    referer: String,
    app_title: String,
    timeout: Duration,
    http: HttpClient,
}

impl OpenRouterClient {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            api_base: config.api_base.clone(),
            referer: config.referer.clone(),
            app_title: config.app_title.clone(),
            timeout: config.timeout,
            http: HttpClient::new(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }
}

pub fn chat_request_body(prompt: &str, model: &str) -> Value {
    json!({
        "model": model,
        "messages": [{
            "role": "user",
            "content": prompt,
        }],
    })
}

impl GenerationBackend for OpenRouterClient {
    fn generate(&self, api_key: &str, prompt: &str, model: &str) -> Result<ChatCompletion> {
        let endpoint = self.endpoint();
        debug!("requesting image from {endpoint} with model {model}");
        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(api_key)
            .header(CONTENT_TYPE, "application/json")
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.app_title)
            .timeout(self.timeout)
            .json(&chat_request_body(prompt, model))
            .send()
            .map_err(|err| {
                ImageGenError::generation_caused_by("Failed to generate image via API", err)
            })?;
        completion_or_error(response)
    }
}

fn completion_or_error(response: HttpResponse) -> Result<ChatCompletion> {
    let status = response.status().as_u16();
    let body = response.text().map_err(|err| {
        ImageGenError::generation_caused_by("OpenRouter response body read failed", err)
    })?;
    check_status(status, &body)?;
    serde_json::from_str(&body).map_err(|err| {
        ImageGenError::generation_caused_by("OpenRouter returned invalid JSON payload", err)
    })
}

/// Maps a non-2xx status to the matching error kind, body included verbatim.
pub fn check_status(status: u16, body: &str) -> Result<()> {
    match status {
        200..=299 => Ok(()),
        401 => Err(ImageGenError::AuthenticationFailure {
            status,
            message: format!(
                "Authentication failed (401): Invalid API key. Please check your {API_KEY_ENV}. Error: {body}"
            ),
        }),
        403 => Err(ImageGenError::AuthenticationFailure {
            status,
            message: format!(
                "Access denied (403): Your API key may not have access to this model. Error: {body}"
            ),
        }),
        _ => Err(ImageGenError::generation(format!(
            "OpenRouter API error: {status} - {body}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use imagegen_contracts::ImageGenError;
    use serde_json::json;

    use super::{chat_request_body, check_status, OpenRouterClient};
    use crate::config::EngineConfig;

    #[test]
    fn request_body_has_single_user_message() {
        assert_eq!(
            chat_request_body("a red fox", "openai/gpt-5-image"),
            json!({
                "model": "openai/gpt-5-image",
                "messages": [{"role": "user", "content": "a red fox"}],
            })
        );
    }

    #[test]
    fn endpoint_uses_configured_base() {
        let config = EngineConfig {
            api_base: "http://localhost:8080/api/v1".to_string(),
            timeout: Duration::from_secs(1),
            ..EngineConfig::default()
        };
        assert_eq!(
            OpenRouterClient::new(&config).endpoint(),
            "http://localhost:8080/api/v1/chat/completions"
        );
    }

    #[test]
    fn unauthorized_and_forbidden_are_auth_failures() {
        match check_status(401, "bad key") {
            Err(ImageGenError::AuthenticationFailure { status, message }) => {
                assert_eq!(status, 401);
                assert!(message.contains("OPENROUTER_API_KEY"));
                assert!(message.ends_with("Error: bad key"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        match check_status(403, "no access") {
            Err(ImageGenError::AuthenticationFailure { status, message }) => {
                assert_eq!(status, 403);
                assert!(message.starts_with("Access denied (403)"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn other_failures_are_generation_failures() {
        let err = check_status(429, "{\"error\":\"rate limited\"}").err();
        assert_eq!(
            err.map(|err| err.to_string()).as_deref(),
            Some("OpenRouter API error: 429 - {\"error\":\"rate limited\"}")
        );
        assert!(check_status(200, "").is_ok());
    }
}
