//! Error kinds shared by every stage of an image generation call.

use std::path::PathBuf;

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, ImageGenError>;

#[derive(Debug, Error)]
pub enum ImageGenError {
    #[error(
        "{var} environment variable is not set. Please set it in your MCP client config or environment."
    )]
    MissingCredential { var: String },

    #[error("{var} appears to be invalid (too short, minimum {min_len} characters). Please check your API key.")]
    CredentialTooShort { var: String, min_len: usize },

    #[error("Unsupported model \"{requested}\". Available models: {}", available.join(", "))]
    ModelNotSupported {
        requested: String,
        available: Vec<String>,
    },

    #[error("{message}")]
    AuthenticationFailure { status: u16, message: String },

    #[error("{message}")]
    GenerationFailure {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("No image data found in input")]
    NoImageData,

    #[error("Invalid data URL format")]
    InvalidDataUrl,

    #[error("Unsupported bytes format")]
    UnsupportedBytesFormat,

    #[error("{message}")]
    ImageProcessing {
        message: String,
        status: Option<u16>,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Failed to write image file {}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ImageGenError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredential { .. } => "missing_credential",
            Self::CredentialTooShort { .. } => "credential_too_short",
            Self::ModelNotSupported { .. } => "model_not_supported",
            Self::AuthenticationFailure { .. } => "authentication_failure",
            Self::GenerationFailure { .. } => "generation_failure",
            Self::NoImageData => "no_image_data",
            Self::InvalidDataUrl => "invalid_data_url",
            Self::UnsupportedBytesFormat => "unsupported_bytes_format",
            Self::ImageProcessing { .. } => "image_processing_failure",
            Self::FileWrite { .. } => "file_write_failure",
        }
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self::GenerationFailure {
            message: message.into(),
            source: None,
        }
    }

    pub fn generation_caused_by(
        message: impl Into<String>,
        cause: impl Into<BoxError>,
    ) -> Self {
        Self::GenerationFailure {
            message: message.into(),
            source: Some(cause.into()),
        }
    }

    pub fn processing(message: impl Into<String>) -> Self {
        Self::ImageProcessing {
            message: message.into(),
            status: None,
            source: None,
        }
    }

    pub fn processing_caused_by(message: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self::ImageProcessing {
            message: message.into(),
            status: None,
            source: Some(cause.into()),
        }
    }

    /// Errors raised by the resolver itself, as opposed to foreign causes it wraps.
    pub fn is_resolver_kind(&self) -> bool {
        matches!(
            self,
            Self::NoImageData
                | Self::InvalidDataUrl
                | Self::UnsupportedBytesFormat
                | Self::ImageProcessing { .. }
        )
    }

    /// Credential and authorization failures; these abort before or at the first remote call.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential { .. }
                | Self::CredentialTooShort { .. }
                | Self::AuthenticationFailure { .. }
        )
    }
}
