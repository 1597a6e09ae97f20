pub mod config;
pub mod credentials;
pub mod data_url;
pub mod extract;
pub mod fetch;
pub mod formatter;
pub mod openrouter;
pub mod resolver;
pub mod service;
pub mod store;

pub use config::EngineConfig;
pub use fetch::{FetchedImage, HttpImageFetcher, ImageFetcher};
pub use openrouter::{GenerationBackend, OpenRouterClient};
pub use resolver::ImageResolver;
pub use service::ImageGenService;
pub use store::ImageStore;
