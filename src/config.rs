//! Configuration types for the extraction service.
//!
//! Two structs cover the two halves of the process:
//!
//! * [`ServiceConfig`]: how a document is turned into text (OCR languages,
//!   pdfium location, render size) and which model receives that text.
//!   Built via [`ServiceConfig::builder()`] so startup code only sets what it
//!   needs and `build()` validates the rest.
//!
//! * [`HttpConfig`]: bind address, debug flag, CORS origins and upload
//!   limit for the HTTP surface.
//!
//! Both are plain values constructed once at startup and handed to the
//! router; nothing here reads the environment.

use crate::error::ConfigError;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Default Tesseract language hint set.
pub const DEFAULT_OCR_LANGUAGES: &str = "eng+hun+deu+fra";

/// Default chat model for the structured-data request.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Base URL of the OpenAI-compatible chat API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration for text extraction and the model request.
///
/// # Example
/// ```rust
/// use allergen_extract::ServiceConfig;
///
/// let config = ServiceConfig::builder()
///     .ocr_languages("eng+deu")
///     .model("gpt-4o-mini")
///     .build()
///     .unwrap();
/// assert_eq!(config.ocr_languages, "eng+deu");
/// ```
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Tesseract language codes joined with `+`. Default: `eng+hun+deu+fra`.
    /// Passed on every OCR call.
    pub ocr_languages: String,

    /// Directory containing `*.traineddata`. If None, Tesseract uses
    /// `TESSDATA_PREFIX` or its compiled-in default.
    pub tessdata_dir: Option<PathBuf>,

    /// Explicit path to the pdfium shared library. If None, the system
    /// library search path is used.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Maximum rendered image dimension (width or height) in pixels for OCR. Default: 2000.
    pub max_rendered_pixels: u32,

    /// Base URL of the chat completions API. Default: `https://api.openai.com/v1`.
    pub api_base_url: String,

    /// LLM model identifier. Default: `gpt-4o-mini`.
    pub model: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            ocr_languages: DEFAULT_OCR_LANGUAGES.to_string(),
            tessdata_dir: None,
            pdfium_lib_path: None,
            max_rendered_pixels: 2000,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Create a new builder for `ServiceConfig`.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    pub fn ocr_languages(mut self, languages: impl Into<String>) -> Self {
        self.config.ocr_languages = languages.into();
        self
    }

    pub fn tessdata_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.tessdata_dir = Some(dir.into());
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServiceConfig, ConfigError> {
        let c = &self.config;
        validate_languages(&c.ocr_languages)?;
        if c.model.trim().is_empty() {
            return Err(ConfigError("Model name must not be empty".into()));
        }
        if !(c.api_base_url.starts_with("http://") || c.api_base_url.starts_with("https://")) {
            return Err(ConfigError(format!(
                "API base URL must start with http:// or https://, got '{}'",
                c.api_base_url
            )));
        }
        Ok(self.config)
    }
}

/// Tesseract expects `lang1+lang2+...` with codes like `eng`, `chi_sim`.
fn validate_languages(languages: &str) -> Result<(), ConfigError> {
    if languages.trim().is_empty() {
        return Err(ConfigError("OCR language set must not be empty".into()));
    }
    for code in languages.split('+') {
        let valid = !code.is_empty()
            && code
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
        if !valid {
            return Err(ConfigError(format!(
                "Invalid OCR language code '{}' in '{}'",
                code, languages
            )));
        }
    }
    Ok(())
}

// ── HTTP ─────────────────────────────────────────────────────────────────

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Address to bind. Default: 0.0.0.0.
    pub host: IpAddr,

    /// TCP port. Default: 5000.
    pub port: u16,

    /// Debug mode: verbose logging and permissive CORS when no origins are listed.
    pub debug: bool,

    /// Allowed CORS origins. `*` allows any origin.
    pub cors_origins: Vec<String>,

    /// Maximum accepted request body in bytes. Default: 25 MiB.
    pub max_upload_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5000,
            debug: false,
            cors_origins: Vec::new(),
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

/// Resolved cross-origin policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsPolicy {
    /// Any origin may call the API.
    AnyOrigin,
    /// Only the listed origins may call the API. Empty means none.
    AllowList(Vec<String>),
}

impl HttpConfig {
    /// The socket address to bind.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Resolve the CORS policy.
    ///
    /// An explicit origin list always wins. Without one, debug mode opens
    /// the API to every origin and production mode allows none.
    pub fn cors_policy(&self) -> CorsPolicy {
        let origins: Vec<String> = self
            .cors_origins
            .iter()
            .map(|o| o.trim().trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty())
            .collect();

        if origins.iter().any(|o| o == "*") {
            return CorsPolicy::AnyOrigin;
        }
        if origins.is_empty() && self.debug {
            return CorsPolicy::AnyOrigin;
        }
        CorsPolicy::AllowList(origins)
    }
}
