//! Wire types shared by the provider trait and the Gemini REST client.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors returned while talking to the model provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid provider URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a usable response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Provider responded with an unexpected status code.
    #[error("Unexpected provider response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the provider.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Resumable upload handshake did not hand back a session URL.
    #[error("Upload session URL missing from provider response")]
    MissingUploadUrl,
}

/// Processing state the provider reports for an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    /// Provider did not report a state.
    #[default]
    StateUnspecified,
    /// File is still being ingested; poll again later.
    Processing,
    /// File can be referenced from generation requests.
    Active,
    /// Provider gave up on the file.
    Failed,
    /// Any state this client does not know about.
    #[serde(other)]
    Unknown,
}

impl FileState {
    /// Upper-case label matching the provider's wire format.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StateUnspecified => "STATE_UNSPECIFIED",
            Self::Processing => "PROCESSING",
            Self::Active => "ACTIVE",
            Self::Failed => "FAILED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider-side handle for an uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    /// Resource name, e.g. `files/abc123`.
    pub name: String,
    /// Human readable label supplied at upload time.
    #[serde(default)]
    pub display_name: Option<String>,
    /// MIME type recorded by the provider.
    #[serde(default)]
    pub mime_type: String,
    /// URI used to reference the file from generation requests.
    #[serde(default)]
    pub uri: String,
    /// Current processing state.
    #[serde(default)]
    pub state: FileState,
}

/// File contents and metadata submitted to [`super::ModelProvider::upload_file`].
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Label shown in the provider console; the local base name.
    pub display_name: String,
    /// MIME type of the payload.
    pub mime_type: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

/// Reference to an uploaded file inside a content part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    /// MIME type of the referenced file.
    pub mime_type: String,
    /// URI returned by the provider for the uploaded file.
    pub file_uri: String,
}

impl From<&RemoteFile> for FileData {
    fn from(file: &RemoteFile) -> Self {
        Self {
            mime_type: file.mime_type.clone(),
            file_uri: file.uri.clone(),
        }
    }
}

/// Single part of a request or response content block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    /// Plain text payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Uploaded file reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_data: Option<FileData>,
}

impl Part {
    /// Text-only part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            file_data: None,
        }
    }

    /// Part that points at an uploaded file.
    pub fn file(file: &RemoteFile) -> Self {
        Self {
            text: None,
            file_data: Some(FileData::from(file)),
        }
    }
}

/// Ordered list of parts attributed to a role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// `user` or `model`; omitted for system instructions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Parts in the order the model should read them.
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Sampling parameters applied to every generation call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling cutoff.
    pub top_p: f32,
    /// Top-k sampling cutoff.
    pub top_k: u32,
    /// Upper bound on generated tokens.
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.42,
            top_p: 1.0,
            top_k: 32,
            max_output_tokens: 4096,
        }
    }
}

/// Body of a `generateContent` call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Conversation turns; this service always sends a single user turn.
    pub contents: Vec<Content>,
    /// Model-level instruction describing the supported modes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    /// Sampling parameters.
    pub generation_config: GenerationConfig,
}

/// Feedback attached to the prompt rather than to a candidate.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Reason the prompt was refused, e.g. `SAFETY`.
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// One generated answer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Generated content; absent when generation stopped early.
    #[serde(default)]
    pub content: Option<Content>,
    /// Why generation stopped.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Body returned by `generateContent`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    /// Generated answers, possibly empty.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Prompt-level feedback such as a block reason.
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

impl GenerateResponse {
    /// Response carrying a single text candidate.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            candidates: vec![Candidate {
                content: Some(Content {
                    role: Some("model".into()),
                    parts: vec![Part::text(text)],
                }),
                finish_reason: Some("STOP".into()),
            }],
            prompt_feedback: None,
        }
    }

    /// Block reason reported for the prompt, if any.
    pub fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_deref())
            .filter(|reason| !reason.is_empty())
    }

    /// Text of the first part of the first candidate, when non-empty.
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .and_then(|content| content.parts.first())
            .and_then(|part| part.text.as_deref())
            .filter(|text| !text.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_state_tolerates_unknown_values() {
        let file: RemoteFile = serde_json::from_value(json!({
            "name": "files/abc",
            "mimeType": "text/plain",
            "uri": "https://example.test/files/abc",
            "state": "ARCHIVED"
        }))
        .expect("remote file");
        assert_eq!(file.state, FileState::Unknown);
        assert_eq!(file.display_name, None);
    }

    #[test]
    fn parts_serialize_with_provider_field_names() {
        let file = RemoteFile {
            name: "files/abc".into(),
            display_name: Some("a.txt".into()),
            mime_type: "text/plain".into(),
            uri: "https://example.test/files/abc".into(),
            state: FileState::Active,
        };
        let value = serde_json::to_value(vec![Part::file(&file), Part::text("hi")]).unwrap();
        assert_eq!(
            value,
            json!([
                { "fileData": { "mimeType": "text/plain", "fileUri": "https://example.test/files/abc" } },
                { "text": "hi" }
            ])
        );
    }

    #[test]
    fn first_text_ignores_non_text_leading_part() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "parts": [ { "inlineData": {} }, { "text": "late" } ] } }
            ]
        }))
        .expect("response");
        assert_eq!(response.first_text(), None);
    }

    #[test]
    fn block_reason_reads_prompt_feedback() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }))
        .expect("response");
        assert_eq!(response.block_reason(), Some("SAFETY"));
        assert!(response.candidates.is_empty());
    }
}
