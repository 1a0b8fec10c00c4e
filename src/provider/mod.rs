//! Remote model provider abstraction.
//!
//! Orchestration code only sees [`ModelProvider`]: upload a file, check its processing state,
//! and run a generation over uploaded files. [`GeminiClient`] is the production implementation.

pub mod gemini;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;

use async_trait::async_trait;

pub use gemini::GeminiClient;
pub use types::{
    Candidate, Content, FileState, FileUpload, GenerateResponse, GenerationConfig, Part,
    PromptFeedback, ProviderError, RemoteFile,
};

/// Narrow interface over the remote model service.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Submit file contents and return the provider handle, usually still processing.
    async fn upload_file(&self, upload: FileUpload) -> Result<RemoteFile, ProviderError>;

    /// Fetch the current state of a previously uploaded file by resource name.
    async fn poll_status(&self, name: &str) -> Result<RemoteFile, ProviderError>;

    /// Generate content from the given files followed by the instruction text.
    async fn generate(
        &self,
        files: &[RemoteFile],
        instruction: &str,
    ) -> Result<GenerateResponse, ProviderError>;
}
