//! Gemini REST client covering the Files API and `generateContent`.
//!
//! Uploads use the resumable protocol: a `start` call registers the display name and size and
//! returns a session URL, then a single `upload, finalize` call sends the bytes. The API key is
//! sent in the `x-goog-api-key` header so it never appears in logged URLs.

use crate::config::Config;
use crate::provider::ModelProvider;
use crate::provider::types::{
    Content, FileUpload, GenerateRequest, GenerateResponse, GenerationConfig, Part,
    ProviderError, RemoteFile,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;

const API_VERSION: &str = "v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

/// HTTP client for the Gemini API.
pub struct GeminiClient {
    pub(crate) http: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: String,
    pub(crate) model: String,
    pub(crate) generation_config: GenerationConfig,
    pub(crate) system_instruction: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: RemoteFile,
}

impl GeminiClient {
    /// Construct a client for the given endpoint, key, and model.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let http = Client::builder().user_agent("textgate/0.1").build()?;
        let base_url = normalize_base_url(base_url).map_err(ProviderError::InvalidUrl)?;
        let model = model.into();
        tracing::debug!(url = %base_url, model = %model, "Initialized Gemini HTTP client");
        Ok(Self {
            http,
            base_url,
            api_key: api_key.into(),
            model,
            generation_config: GenerationConfig::default(),
            system_instruction: None,
        })
    }

    /// Construct a client from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        Self::new(
            &config.gemini_base_url,
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
        )
    }

    /// Attach the model-level system instruction sent with every generation call.
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(API_KEY_HEADER, &self.api_key)
    }

    async fn ensure_success(response: Response) -> Result<Response, ProviderError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(ProviderError::UnexpectedStatus { status, body })
    }

    async fn start_upload(&self, upload: &FileUpload) -> Result<String, ProviderError> {
        let response = self
            .authorized(
                self.http
                    .post(self.endpoint(&format!("upload/{API_VERSION}/files"))),
            )
            .header("x-goog-upload-protocol", "resumable")
            .header("x-goog-upload-command", "start")
            .header(
                "x-goog-upload-header-content-length",
                upload.bytes.len().to_string(),
            )
            .header("x-goog-upload-header-content-type", &upload.mime_type)
            .json(&json!({ "file": { "display_name": upload.display_name } }))
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;

        response
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or(ProviderError::MissingUploadUrl)
    }
}

#[async_trait]
impl ModelProvider for GeminiClient {
    async fn upload_file(&self, upload: FileUpload) -> Result<RemoteFile, ProviderError> {
        let session_url = self.start_upload(&upload).await?;
        tracing::debug!(display_name = %upload.display_name, "Upload session opened");

        let size = upload.bytes.len();
        let response = self
            .authorized(self.http.post(session_url))
            .header("x-goog-upload-offset", "0")
            .header("x-goog-upload-command", "upload, finalize")
            .body(upload.bytes)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let UploadResponse { file } = response.json().await?;
        tracing::debug!(
            name = %file.name,
            state = %file.state,
            bytes = size,
            "File uploaded"
        );
        Ok(file)
    }

    async fn poll_status(&self, name: &str) -> Result<RemoteFile, ProviderError> {
        let response = self
            .authorized(self.http.get(self.endpoint(&format!("{API_VERSION}/{name}"))))
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.json().await?)
    }

    async fn generate(
        &self,
        files: &[RemoteFile],
        instruction: &str,
    ) -> Result<GenerateResponse, ProviderError> {
        let mut parts: Vec<Part> = files.iter().map(Part::file).collect();
        parts.push(Part::text(instruction));

        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user".into()),
                parts,
            }],
            system_instruction: self.system_instruction.as_ref().map(|text| Content {
                role: None,
                parts: vec![Part::text(text.clone())],
            }),
            generation_config: self.generation_config,
        };

        let response = self
            .authorized(self.http.post(self.endpoint(&format!(
                "{API_VERSION}/models/{}:generateContent",
                self.model
            ))))
            .json(&request)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.json().await?)
    }
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}
