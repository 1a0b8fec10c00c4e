//! Single dispatch path shared by every mode.

use crate::provider::{ModelProvider, ProviderError, RemoteFile};
use thiserror::Error;

/// Failures raised while running a query against the provider.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Provider refused the prompt.
    #[error("Prompt blocked: {0}")]
    Blocked(String),
    /// Provider answered without any candidate.
    #[error("No candidates returned by Gemini.")]
    NoCandidates,
    /// First candidate had no text part.
    #[error("Gemini response did not contain text.")]
    MissingText,
    /// Transport or provider-side failure.
    #[error("Gemini query failed: {0}")]
    Provider(#[from] ProviderError),
}

impl DispatchError {
    /// Whether the failure is attributable to the caller's prompt.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Blocked(_))
    }
}

/// Send `files` followed by `instruction` to the provider and return the first text answer.
pub async fn dispatch<P>(
    provider: &P,
    instruction: &str,
    files: &[RemoteFile],
) -> Result<String, DispatchError>
where
    P: ModelProvider + ?Sized,
{
    tracing::debug!(instruction, files = files.len(), "Dispatching query");
    let response = provider.generate(files, instruction).await.map_err(|error| {
        tracing::error!(instruction, error = %error, "Provider call failed");
        DispatchError::Provider(error)
    })?;

    if let Some(reason) = response.block_reason() {
        tracing::error!(instruction, reason, "Prompt was blocked");
        return Err(DispatchError::Blocked(reason.to_string()));
    }

    if response.candidates.is_empty() {
        tracing::error!(instruction, "No candidates returned");
        return Err(DispatchError::NoCandidates);
    }

    match response.first_text() {
        Some(text) => Ok(text.to_string()),
        None => {
            tracing::error!(
                instruction,
                finish_reason = ?response.candidates[0].finish_reason,
                "Response did not contain text"
            );
            Err(DispatchError::MissingText)
        }
    }
}
