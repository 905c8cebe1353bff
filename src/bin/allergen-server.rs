//! HTTP server binary for allergen-extract.
//!
//! A thin shim over the library crate: maps flags / environment variables to
//! `ServiceConfig` + `HttpConfig`, checks the native engines, and serves the
//! router until Ctrl-C or SIGTERM.

use allergen_extract::pipeline::ocr::TesseractOcr;
use allergen_extract::pipeline::render::bind_pdfium;
use allergen_extract::{
    router, AppState, HttpConfig, LlmStructuredModel, PdfTextExtractor, ServiceConfig,
};
use anyhow::{Context, Result};
use clap::builder::FalseyValueParser;
use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Development: verbose logs, any origin allowed
  DEBUG=true OPENAI_API_KEY=sk-... allergen-server

  # Production behind a known frontend
  OPENAI_API_KEY=sk-... CORS_ORIGINS=https://labels.example.com allergen-server --port 8080

  # Call it
  curl -F file=@label.pdf http://localhost:5000/extract

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY     OpenAI API key (required)
  OPENAI_MODEL       Chat model (default gpt-4o-mini)
  OPENAI_BASE_URL    Chat API base URL (default https://api.openai.com/v1)
  HOST / PORT        Bind address (default 0.0.0.0:5000)
  DEBUG              Debug mode: debug logs, permissive CORS fallback
  CORS_ORIGINS       Comma-separated allowed origins, or *
  OCR_LANGUAGES      Tesseract languages joined with + (default eng+hun+deu+fra)
  TESSDATA_DIR       Directory with *.traineddata files
  PDFIUM_LIB_PATH    Path to libpdfium (default: system search path)
  RUST_LOG           Overrides the log filter

A .env file in the working directory is loaded first if present."#;

#[derive(Parser, Debug)]
#[command(
    name = "allergen-server",
    version,
    about = "Extract allergen and nutrition data from PDF uploads",
    after_help = AFTER_HELP
)]
struct Cli {
    /// OpenAI API key for the structured-data request.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: String,

    /// Chat model used for extraction.
    #[arg(long, env = "OPENAI_MODEL", default_value = allergen_extract::config::DEFAULT_MODEL)]
    model: String,

    /// Base URL of the OpenAI-compatible chat API.
    #[arg(long, env = "OPENAI_BASE_URL", default_value = allergen_extract::config::DEFAULT_API_BASE_URL)]
    openai_base_url: String,

    /// Address to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to bind.
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    port: u16,

    /// Debug mode: DEBUG-level logs and any CORS origin when none are listed.
    #[arg(long, env = "DEBUG", value_parser = FalseyValueParser::new())]
    debug: bool,

    /// Allowed CORS origins (comma-separated), or `*`.
    #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',')]
    cors_origins: Vec<String>,

    /// Maximum upload size in bytes.
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = 25 * 1024 * 1024)]
    max_upload_bytes: usize,

    /// Tesseract language set for scanned pages.
    #[arg(long, env = "OCR_LANGUAGES", default_value = allergen_extract::config::DEFAULT_OCR_LANGUAGES)]
    ocr_languages: String,

    /// Directory containing Tesseract *.traineddata files.
    #[arg(long, env = "TESSDATA_DIR")]
    tessdata_dir: Option<PathBuf>,

    /// Path to the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib_path: Option<PathBuf>,

    /// Longest rendered edge in pixels for OCR.
    #[arg(long, env = "MAX_RENDERED_PIXELS", default_value_t = 2000)]
    max_rendered_pixels: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Missing .env is fine; every value can come from the real environment.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The API key travels as a default header, so the provider's per-request
    // "no API key" warning is noise.
    let level = if cli.debug { "debug" } else { "info" };
    let filter = format!("{level},edgequake_llm::providers::openai_compatible=error");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let config = Arc::new(build_config(&cli)?);
    let http = HttpConfig {
        host: cli.host,
        port: cli.port,
        debug: cli.debug,
        cors_origins: cli.cors_origins.clone(),
        max_upload_bytes: cli.max_upload_bytes,
    };

    // ── Engine checks ────────────────────────────────────────────────────
    // pdfium is required for every request; fail fast if it cannot be bound.
    bind_pdfium(config.pdfium_lib_path.as_deref()).context("PDF engine unavailable")?;
    info!("pdfium bound");

    // Tesseract is only needed for scanned pages, so a missing language
    // pack is worth a warning but not a refusal to start.
    let ocr = TesseractOcr::new(config.tessdata_dir.as_deref());
    match ocr.check_languages(&config.ocr_languages) {
        Ok(()) => info!("Tesseract ready: {}", config.ocr_languages),
        Err(e) => warn!("{}; scanned pages will fail to extract", e),
    }

    // ── Model provider ───────────────────────────────────────────────────
    let model = LlmStructuredModel::openai(&config, &cli.openai_api_key)
        .context("Failed to create LLM provider")?;

    // ── Serve ────────────────────────────────────────────────────────────
    let extractor = PdfTextExtractor::new(Arc::clone(&config), Arc::new(ocr));
    let state = AppState::new(Arc::new(extractor), Arc::new(model));
    let app = router(state, &http);

    let addr = http.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(
        "Listening on http://{} ({} mode)",
        addr,
        if http.debug { "debug" } else { "production" }
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Map CLI args to `ServiceConfig`.
fn build_config(cli: &Cli) -> Result<ServiceConfig> {
    let mut builder = ServiceConfig::builder()
        .model(cli.model.clone())
        .api_base_url(cli.openai_base_url.clone())
        .ocr_languages(cli.ocr_languages.clone())
        .max_rendered_pixels(cli.max_rendered_pixels);

    if let Some(ref dir) = cli.tessdata_dir {
        builder = builder.tessdata_dir(dir.clone());
    }
    if let Some(ref path) = cli.pdfium_lib_path {
        builder = builder.pdfium_lib_path(path.clone());
    }

    builder.build().context("Invalid configuration")
}

/// Resolve on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
