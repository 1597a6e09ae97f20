use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";
pub const DEFAULT_API_BASE: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_REFERER: &str = "https://github.com/openrouter-image-gen-mcp";
pub const DEFAULT_APP_TITLE: &str = "OpenRouter Image Generation MCP Server";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_OUTPUT_DIR: &str = "generated_images";

pub const SERVER_NAME: &str = "openrouter-image-gen-mcp";
pub const SERVER_VERSION: &str = "1.1.0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub referer: String,
    pub app_title: String,
    pub timeout: Duration,
    pub output_dir: PathBuf,
    pub events_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            app_title: DEFAULT_APP_TITLE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            events_path: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(non_empty_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let timeout = lookup("OPENROUTER_TIMEOUT_SECS")
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);
        Self {
            api_key: lookup(API_KEY_ENV),
            api_base: lookup("OPENROUTER_API_BASE")
                .map(|value| value.trim().trim_end_matches('/').to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or(defaults.api_base),
            referer: lookup("OPENROUTER_HTTP_REFERER").unwrap_or(defaults.referer),
            app_title: lookup("OPENROUTER_X_TITLE").unwrap_or(defaults.app_title),
            timeout,
            output_dir: lookup("IMAGEGEN_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            events_path: lookup("IMAGEGEN_EVENTS_PATH").map(PathBuf::from),
        }
    }

    /// Output directory anchored at the working directory when relative.
    pub fn absolute_output_dir(&self) -> PathBuf {
        if self.output_dir.is_absolute() {
            return self.output_dir.clone();
        }
        env::current_dir()
            .map(|cwd| cwd.join(&self.output_dir))
            .unwrap_or_else(|_| self.output_dir.clone())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    use super::{EngineConfig, DEFAULT_API_BASE};

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = EngineConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn overrides_are_read_and_trimmed() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            ("OPENROUTER_API_KEY", "sk-or-v1-abcdefghijklmnop"),
            ("OPENROUTER_API_BASE", "http://localhost:9000/v1/"),
            ("OPENROUTER_TIMEOUT_SECS", "5"),
            ("IMAGEGEN_OUTPUT_DIR", "/srv/images"),
            ("IMAGEGEN_EVENTS_PATH", "/srv/events.jsonl"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("sk-or-v1-abcdefghijklmnop"));
        assert_eq!(config.api_base, "http://localhost:9000/v1");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.absolute_output_dir(), PathBuf::from("/srv/images"));
        assert_eq!(config.events_path, Some(PathBuf::from("/srv/events.jsonl")));
    }

    #[test]
    fn invalid_timeout_keeps_default() {
        let config = EngineConfig::from_lookup(lookup_from(&[("OPENROUTER_TIMEOUT_SECS", "0")]));
        assert_eq!(config.timeout, Duration::from_secs(30));
        let config =
            EngineConfig::from_lookup(lookup_from(&[("OPENROUTER_TIMEOUT_SECS", "soon")]));
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}
