//! Upload a local file to the provider and wait until it can be referenced.

use crate::config::PollPolicy;
use crate::provider::{FileState, FileUpload, ModelProvider, ProviderError, RemoteFile};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// MIME type used for every registered document.
pub const TEXT_MIME_TYPE: &str = "text/plain";

/// Errors raised while validating, uploading, or activating a file.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Source file does not exist.
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    /// Source path points at a directory.
    #[error("{} is a directory!", .0.display())]
    IsDirectory(PathBuf),
    /// Source file has no content.
    #[error("{} is empty!", .0.display())]
    Empty(PathBuf),
    /// Source file exists but could not be inspected or read.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// Provider rejected the upload or a status check.
    #[error("Failed to upload to Gemini: {0}")]
    Provider(#[from] ProviderError),
    /// Provider finished processing with a state other than active.
    #[error("File {name} failed to process (state {state}).")]
    NotActive {
        /// Provider resource name.
        name: String,
        /// Terminal state reported by the provider.
        state: FileState,
    },
    /// Provider kept the file in processing past the polling budget.
    #[error("File {name} still processing after {polls} status checks.")]
    TimedOut {
        /// Provider resource name.
        name: String,
        /// Number of status checks performed.
        polls: u32,
    },
}

/// Check that `path` is an existing, non-empty regular file and return its size.
pub async fn validate_source(path: &Path) -> Result<u64, UploadError> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(UploadError::NotFound(path.to_path_buf()));
        }
        Err(source) => {
            return Err(UploadError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    if metadata.is_dir() {
        return Err(UploadError::IsDirectory(path.to_path_buf()));
    }
    if metadata.len() == 0 {
        return Err(UploadError::Empty(path.to_path_buf()));
    }
    Ok(metadata.len())
}

/// Upload `path` and block until the provider reports it active.
///
/// The path is validated before any network call. Polling follows `policy`: one status check
/// per interval while the provider reports `PROCESSING`, giving up after `policy.max_polls`.
pub async fn upload<P>(
    provider: &P,
    path: &Path,
    mime_type: &str,
    policy: PollPolicy,
) -> Result<RemoteFile, UploadError>
where
    P: ModelProvider + ?Sized,
{
    let size = validate_source(path).await?;
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| UploadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let display_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    tracing::debug!(path = %path.display(), size, mime_type, "Uploading file");
    let file = provider
        .upload_file(FileUpload {
            display_name,
            mime_type: mime_type.to_string(),
            bytes,
        })
        .await?;
    tracing::debug!(path = %path.display(), name = %file.name, "File uploaded");

    wait_for_active(provider, file, policy).await
}

async fn wait_for_active<P>(
    provider: &P,
    mut file: RemoteFile,
    policy: PollPolicy,
) -> Result<RemoteFile, UploadError>
where
    P: ModelProvider + ?Sized,
{
    let mut polls = 0;
    while file.state == FileState::Processing {
        if polls >= policy.max_polls {
            tracing::error!(name = %file.name, polls, "File never left processing");
            return Err(UploadError::TimedOut {
                name: file.name,
                polls,
            });
        }
        tracing::debug!(name = %file.name, polls, "File is still processing");
        tokio::time::sleep(policy.interval).await;
        polls += 1;
        file = provider.poll_status(&file.name).await?;
        tracing::debug!(name = %file.name, state = %file.state, "Refreshed file status");
    }

    if file.state != FileState::Active {
        tracing::error!(name = %file.name, state = %file.state, "File failed to process");
        return Err(UploadError::NotActive {
            name: file.name,
            state: file.state,
        });
    }

    tracing::debug!(name = %file.name, polls, "File is active");
    Ok(file)
}
