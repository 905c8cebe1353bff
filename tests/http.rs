//! HTTP-level tests for `POST /extract` and `GET /health`.
//!
//! The extractor and model are replaced with in-memory fakes so these run
//! without pdfium, Tesseract or network access.

use allergen_extract::{
    router, AppState, ExtractError, HttpConfig, ModelError, OcrError, StructuredDataModel,
    TextExtractor,
};
use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

const PDF_BYTES: &[u8] = b"%PDF-1.4\n%fake label\n";
const LABEL_TEXT: &str = "Ingredients: milk, wheat. Energy 250kJ/100g.";
const MODEL_JSON: &str = r#"{"allergens":["milk","wheat"],"nutritional_values":{"Energy":"250kJ/100g","Fat":"none","Carbohydrate":"none","Sugar":"none","Protein":"none","Sodium":"none"}}"#;

// ── Fakes ────────────────────────────────────────────────────────────────

struct FakeExtractor {
    reply: Box<dyn Fn() -> Result<String, ExtractError> + Send + Sync>,
    seen: Mutex<Vec<Vec<u8>>>,
}

impl FakeExtractor {
    fn text(text: &'static str) -> Arc<Self> {
        Self::replying(move || Ok(text.to_string()))
    }

    fn replying(
        reply: impl Fn() -> Result<String, ExtractError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            reply: Box::new(reply),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<Vec<u8>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextExtractor for FakeExtractor {
    async fn extract(&self, bytes: Vec<u8>) -> Result<String, ExtractError> {
        self.seen.lock().unwrap().push(bytes);
        (self.reply)()
    }
}

struct FakeModel {
    reply: Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl FakeModel {
    fn ok(content: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(content.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl StructuredDataModel for FakeModel {
    async fn complete_json(&self, prompt: &str) -> Result<String, ModelError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply
            .clone()
            .map_err(|message| ModelError::Request { message })
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn server_with(
    extractor: Arc<FakeExtractor>,
    model: Arc<FakeModel>,
    http: &HttpConfig,
) -> TestServer {
    let app = router(AppState::new(extractor, model), http);
    TestServer::new(app).unwrap()
}

fn server(extractor: Arc<FakeExtractor>, model: Arc<FakeModel>) -> TestServer {
    server_with(extractor, model, &HttpConfig::default())
}

fn pdf_form(bytes: &[u8]) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(bytes.to_vec())
            .file_name("label.pdf")
            .mime_type("application/pdf"),
    )
}

// ── /extract ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn returns_model_json_verbatim() {
    let extractor = FakeExtractor::text(LABEL_TEXT);
    let model = FakeModel::ok(MODEL_JSON);
    let server = server(extractor.clone(), model.clone());

    let response = server.post("/extract").multipart(pdf_form(PDF_BYTES)).await;

    response.assert_status_ok();
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );
    assert_eq!(response.text(), MODEL_JSON);

    let body: Value = response.json();
    assert_eq!(body["allergens"], json!(["milk", "wheat"]));
    assert_eq!(body["nutritional_values"]["Energy"], "250kJ/100g");
    assert_eq!(body["nutritional_values"]["Fat"], "none");
    assert_eq!(body["nutritional_values"]["Sodium"], "none");

    assert_eq!(extractor.calls(), vec![PDF_BYTES.to_vec()]);
    let prompts = model.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].ends_with(LABEL_TEXT));
}

#[tokio::test]
async fn non_json_model_output_is_passed_through() {
    let server = server(
        FakeExtractor::text(LABEL_TEXT),
        FakeModel::ok("Sure! Here is the data."),
    );

    let response = server.post("/extract").multipart(pdf_form(PDF_BYTES)).await;

    response.assert_status_ok();
    assert_eq!(response.text(), "Sure! Here is the data.");
}

#[tokio::test]
async fn file_field_is_found_among_other_fields() {
    let extractor = FakeExtractor::text(LABEL_TEXT);
    let server = server(extractor.clone(), FakeModel::ok(MODEL_JSON));

    let form = MultipartForm::new()
        .add_text("note", "front label")
        .add_part(
            "file",
            Part::bytes(PDF_BYTES.to_vec()).file_name("label.pdf"),
        );
    let response = server.post("/extract").multipart(form).await;

    response.assert_status_ok();
    assert_eq!(extractor.calls(), vec![PDF_BYTES.to_vec()]);
}

#[tokio::test]
async fn missing_file_field_is_rejected() {
    let extractor = FakeExtractor::text(LABEL_TEXT);
    let model = FakeModel::ok(MODEL_JSON);
    let server = server(extractor.clone(), model.clone());

    let form = MultipartForm::new().add_text("document", "not the right field");
    let response = server.post("/extract").multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({ "error": "No file uploaded" }));
    assert!(extractor.calls().is_empty());
    assert!(model.prompts().is_empty());
}

#[tokio::test]
async fn non_multipart_body_is_treated_as_missing_file() {
    let server = server(FakeExtractor::text(LABEL_TEXT), FakeModel::ok(MODEL_JSON));

    let response = server.post("/extract").json(&json!({ "file": "x" })).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({ "error": "No file uploaded" }));
}

#[tokio::test]
async fn blank_text_never_reaches_the_model() {
    let model = FakeModel::ok(MODEL_JSON);
    let server = server(FakeExtractor::text("  \n\t "), model.clone());

    let response = server.post("/extract").multipart(pdf_form(PDF_BYTES)).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({ "error": "Could not extract text" }));
    assert!(model.prompts().is_empty());
}

#[tokio::test]
async fn unparseable_document_is_a_client_error() {
    let model = FakeModel::ok(MODEL_JSON);
    let extractor = FakeExtractor::replying(|| {
        Err(ExtractError::DocumentParse {
            detail: "not a PDF".into(),
        })
    });
    let server = server(extractor, model.clone());

    let response = server.post("/extract").multipart(pdf_form(b"hello")).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({ "error": "Could not extract text" }));
    assert!(model.prompts().is_empty());
}

#[tokio::test]
async fn ocr_failure_is_a_client_error() {
    let extractor = FakeExtractor::replying(|| {
        Err(ExtractError::Ocr {
            page: 2,
            source: OcrError::Recognize("no text found".into()),
        })
    });
    let server = server(extractor, FakeModel::ok(MODEL_JSON));

    let response = server.post("/extract").multipart(pdf_form(PDF_BYTES)).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({ "error": "Could not extract text" }));
}

#[tokio::test]
async fn missing_engine_is_a_server_error() {
    let extractor = FakeExtractor::replying(|| {
        Err(ExtractError::EngineUnavailable(
            "libpdfium.so: cannot open shared object file".into(),
        ))
    });
    let server = server(extractor, FakeModel::ok(MODEL_JSON));

    let response = server.post("/extract").multipart(pdf_form(PDF_BYTES)).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    response.assert_json(&json!({ "error": "Text extraction engine unavailable" }));
}

#[tokio::test]
async fn model_failure_is_a_bad_gateway() {
    let model = FakeModel::failing("401 invalid api key");
    let server = server(FakeExtractor::text(LABEL_TEXT), model.clone());

    let response = server.post("/extract").multipart(pdf_form(PDF_BYTES)).await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    response.assert_json(&json!({ "error": "Model request failed" }));
    assert_eq!(model.prompts().len(), 1);
}

#[tokio::test]
async fn oversized_upload_is_refused() {
    let http = HttpConfig {
        max_upload_bytes: 1024,
        ..HttpConfig::default()
    };
    let extractor = FakeExtractor::text(LABEL_TEXT);
    let server = server_with(extractor.clone(), FakeModel::ok(MODEL_JSON), &http);

    let mut big = PDF_BYTES.to_vec();
    big.resize(8 * 1024, b'0');
    let response = server.post("/extract").multipart(pdf_form(&big)).await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    assert!(extractor.calls().is_empty());
}

#[tokio::test]
async fn requests_do_not_share_state() {
    let extractor = FakeExtractor::text(LABEL_TEXT);
    let model = FakeModel::ok(MODEL_JSON);
    let server = server(extractor.clone(), model.clone());

    for _ in 0..3 {
        let response = server.post("/extract").multipart(pdf_form(PDF_BYTES)).await;
        response.assert_status_ok();
        assert_eq!(response.text(), MODEL_JSON);
    }
    assert_eq!(extractor.calls().len(), 3);
    assert!(model.prompts().iter().all(|p| p == &model.prompts()[0]));
}

// ── /health and CORS ─────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_ok() {
    let server = server(FakeExtractor::text(LABEL_TEXT), FakeModel::ok(MODEL_JSON));

    let response = server.get("/health").await;

    response.assert_status_ok();
    response.assert_json(&json!({ "status": "ok" }));
}

#[tokio::test]
async fn debug_mode_allows_any_origin() {
    let http = HttpConfig {
        debug: true,
        ..HttpConfig::default()
    };
    let server = server_with(
        FakeExtractor::text(LABEL_TEXT),
        FakeModel::ok(MODEL_JSON),
        &http,
    );

    let response = server
        .get("/health")
        .add_header("origin", "https://anywhere.example")
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.headers()["access-control-allow-origin"]
            .to_str()
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn allow_list_echoes_only_listed_origins() {
    let http = HttpConfig {
        cors_origins: vec!["https://labels.example.com/".into()],
        ..HttpConfig::default()
    };
    let server = server_with(
        FakeExtractor::text(LABEL_TEXT),
        FakeModel::ok(MODEL_JSON),
        &http,
    );

    let allowed = server
        .get("/health")
        .add_header("origin", "https://labels.example.com")
        .await;
    assert_eq!(
        allowed.headers()["access-control-allow-origin"]
            .to_str()
            .unwrap(),
        "https://labels.example.com"
    );

    let refused = server
        .get("/health")
        .add_header("origin", "https://evil.example")
        .await;
    assert!(refused
        .headers()
        .get("access-control-allow-origin")
        .is_none());
}
