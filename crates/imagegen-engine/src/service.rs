use imagegen_contracts::events::{EventLog, ToolEvent};
use imagegen_contracts::images::ImageDescriptor;
use imagegen_contracts::models::ModelRegistry;
use imagegen_contracts::requests::{normalize_request, ImageGenerationRequest};
use imagegen_contracts::responses::ResponseEnvelope;
use imagegen_contracts::Result;
use tracing::{error, info, warn};

use crate::config::EngineConfig;
use crate::credentials::{mask_api_key, validate_api_key};
use crate::extract::extract_image_url;
use crate::fetch::HttpImageFetcher;
use crate::formatter::{format_envelope, format_model_list, EnvelopeParams};
use crate::openrouter::{GenerationBackend, OpenRouterClient};
use crate::resolver::ImageResolver;
use crate::store::ImageStore;

/// Runs one tool invocation end to end: validate, generate, extract, save, format.
pub struct ImageGenService {
    api_key: Option<String>,
    registry: ModelRegistry,
    backend: Box<dyn GenerationBackend>,
    store: ImageStore,
    events: EventLog,
}

impl ImageGenService {
    pub fn new(
        api_key: Option<String>,
        registry: ModelRegistry,
        backend: Box<dyn GenerationBackend>,
        store: ImageStore,
        events: EventLog,
    ) -> Self {
        Self {
            api_key,
            registry,
            backend,
            store,
            events,
        }
    }

    /// Wires the HTTP client, fetcher and store from configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        let events = config
            .events_path
            .as_ref()
            .map(EventLog::new)
            .unwrap_or_else(EventLog::disabled);
        let fetcher = HttpImageFetcher::new(config.timeout);
        let store = ImageStore::new(
            ImageResolver::new(Box::new(fetcher)),
            config.absolute_output_dir(),
        )
        .with_events(events.clone());

        match config.api_key.as_deref() {
            Some(key) => info!("API key loaded: {}", mask_api_key(Some(key))),
            None => warn!("OPENROUTER_API_KEY environment variable is not set"),
        }

        Self::new(
            config.api_key.clone(),
            ModelRegistry::default(),
            Box::new(OpenRouterClient::new(config)),
            store,
            events,
        )
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn list_models(&self) -> String {
        format_model_list(&self.registry)
    }

    pub fn generate_image(&self, request: &ImageGenerationRequest) -> Result<ResponseEnvelope> {
        let result = self.run_generation(request);
        if let Err(err) = &result {
            if err.is_auth() {
                warn!(kind = err.kind(), "credential rejected: {err}");
            } else {
                error!(kind = err.kind(), "failed to generate image: {err}");
            }
            self.record(ToolEvent::GenerationFailed {
                kind: err.kind().to_string(),
                error: err.to_string(),
            });
        }
        result
    }

    fn run_generation(&self, request: &ImageGenerationRequest) -> Result<ResponseEnvelope> {
        let api_key = validate_api_key(self.api_key.as_deref())?;
        let args = normalize_request(request, &self.registry)?;
        self.record(ToolEvent::GenerationStarted {
            model: args.model.clone(),
            save_to_file: args.save_to_file,
        });

        let completion = self.backend.generate(api_key, &args.prompt, &args.model)?;
        let image_url = extract_image_url(completion.content(), Some(completion.images()));
        if image_url.is_none() {
            info!("model {} returned no image reference", args.model);
        }

        let saved_file = match image_url.as_deref() {
            Some(url) if args.save_to_file => self.save_first(url, &args.filename)?,
            _ => None,
        };

        let envelope = format_envelope(EnvelopeParams {
            prompt: &args.prompt,
            model: &args.model,
            image_url: image_url.as_deref(),
            saved_file: saved_file.as_deref(),
            completion: &completion,
            show_full_response: args.show_full_response,
        });
        self.record(ToolEvent::GenerationCompleted {
            model: args.model.clone(),
            image_found: envelope.image.is_some(),
            saved_to: envelope.saved_to.clone(),
            tokens: envelope.usage.map(|usage| usage.tokens),
        });
        Ok(envelope)
    }

    fn save_first(&self, image_url: &str, filename: &str) -> Result<Option<String>> {
        let descriptor = if image_url.starts_with("data:") || image_url.starts_with("http") {
            ImageDescriptor::from_url(image_url)
        } else {
            ImageDescriptor::from_base64(image_url)
        };
        let saved = self.store.save_images(&[descriptor], filename)?;
        Ok(saved
            .first()
            .map(|path| path.to_string_lossy().to_string()))
    }

    fn record(&self, event: ToolEvent) {
        if let Err(err) = self.events.record(&event) {
            warn!("event log write failed: {err:#}");
        }
    }
}

impl std::fmt::Debug for ImageGenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageGenService")
            .field("api_key", &mask_api_key(self.api_key.as_deref()))
            .field("models", &self.registry.ids())
            .field("output_dir", &self.store.output_dir())
            .finish()
    }
}
