use std::env;
use std::fmt::Debug;

use concierge_model::ErrorKind;

use crate::Error;

const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_BASE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta";

/// Builder for [`GeminiConfig`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct GeminiConfigBuilder {
    api_key: String,
    model: Option<String>,
    base_url: Option<String>,
}

impl GeminiConfigBuilder {
    /// Creates a builder with the given API key.
    #[inline]
    pub fn with_api_key<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: api_key.into(),
            model: None,
            base_url: None,
        }
    }

    /// Creates a builder from process environment variables.
    ///
    /// `GEMINI_API_KEY` is required; `GEMINI_MODEL` and `GEMINI_BASE_URL`
    /// override the defaults when set. A missing key is reported as a
    /// [`ErrorKind::MissingCredential`] error so that the caller can
    /// surface it as a session-initialization failure.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = env::var("GEMINI_API_KEY").map_err(|_| {
            Error::new(
                "GEMINI_API_KEY environment variable is not set",
                ErrorKind::MissingCredential,
            )
        })?;
        let mut builder = Self::with_api_key(api_key);
        if let Ok(model) = env::var("GEMINI_MODEL") {
            builder = builder.with_model(model);
        }
        if let Ok(base_url) = env::var("GEMINI_BASE_URL") {
            builder = builder.with_base_url(base_url);
        }
        Ok(builder)
    }

    /// Sets the model to use.
    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets a custom base URL.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> GeminiConfig {
        GeminiConfig {
            api_key: self.api_key,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }
}

impl Debug for GeminiConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfigBuilder")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Configuration for the generative-language backend.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct GeminiConfig {
    pub(crate) api_key: String,
    pub(crate) model: String,
    pub(crate) base_url: String,
}

impl Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}
