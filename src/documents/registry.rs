//! Immutable registry of the three uploaded documents.
//!
//! [`load_registry`] is the only way to build a [`Registry`] from disk: it validates every
//! source file first, then uploads them one after another. Any failure aborts the whole load, so
//! a registry value always holds three active documents.

use crate::config::PollPolicy;
use crate::documents::document::{Document, DocumentId};
use crate::documents::uploader::{TEXT_MIME_TYPE, UploadError, upload, validate_source};
use crate::provider::{ModelProvider, RemoteFile};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that prevent the registry from being built.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A document failed validation or upload.
    #[error("Document {id} could not be registered: {source}")]
    Upload {
        /// Document that failed.
        id: DocumentId,
        /// Underlying upload failure.
        #[source]
        source: UploadError,
    },
    /// A document handed to the registry had not reached the active state.
    #[error("Document {0} is not active")]
    NotActive(DocumentId),
    /// Documents were missing or out of order.
    #[error("Registry requires documents a, b, c in order")]
    Incomplete,
}

/// Document that finished uploading and can be referenced by queries.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredDocument {
    /// Document identifier.
    pub id: DocumentId,
    /// Local source path.
    pub path: PathBuf,
    /// Provider handle.
    pub remote: RemoteFile,
}

impl TryFrom<Document> for RegisteredDocument {
    type Error = RegistryError;

    fn try_from(document: Document) -> Result<Self, Self::Error> {
        let remote = document
            .remote()
            .cloned()
            .ok_or(RegistryError::NotActive(document.id()))?;
        Ok(Self {
            id: document.id(),
            path: document.path().to_path_buf(),
            remote,
        })
    }
}

/// Read-only mapping from [`DocumentId`] to its active document.
#[derive(Debug, Clone)]
pub struct Registry {
    documents: [RegisteredDocument; 3],
}

impl Registry {
    /// Build a registry from three active documents ordered `a`, `b`, `c`.
    pub fn from_documents(documents: Vec<Document>) -> Result<Self, RegistryError> {
        let registered = documents
            .into_iter()
            .map(RegisteredDocument::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let documents: [RegisteredDocument; 3] = registered
            .try_into()
            .map_err(|_| RegistryError::Incomplete)?;
        let ordered = documents
            .iter()
            .zip(DocumentId::ALL)
            .all(|(document, id)| document.id == id);
        if !ordered {
            return Err(RegistryError::Incomplete);
        }
        Ok(Self { documents })
    }

    /// Look up a document; every identifier is always present.
    pub fn get(&self, id: DocumentId) -> &RegisteredDocument {
        &self.documents[id.index()]
    }

    /// Documents in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredDocument> {
        self.documents.iter()
    }
}

/// Validate and upload `a.txt`, `b.txt`, and `c.txt` from `dir`, sequentially.
pub async fn load_registry<P>(
    provider: &P,
    dir: &Path,
    policy: PollPolicy,
) -> Result<Registry, RegistryError>
where
    P: ModelProvider + ?Sized,
{
    tracing::info!(dir = %dir.display(), "Registering documents");
    let mut documents: Vec<Document> = DocumentId::ALL
        .iter()
        .map(|id| Document::new(*id, dir))
        .collect();

    for document in &documents {
        if let Err(source) = validate_source(document.path()).await {
            tracing::error!(
                document = %document.id(),
                path = %document.path().display(),
                error = %source,
                "Document source is unusable"
            );
            return Err(RegistryError::Upload {
                id: document.id(),
                source,
            });
        }
    }

    for document in &mut documents {
        document.mark_uploading();
        match upload(provider, document.path(), TEXT_MIME_TYPE, policy).await {
            Ok(remote) => {
                tracing::info!(
                    document = %document.id(),
                    name = %remote.name,
                    "Document registered"
                );
                document.mark_active(remote);
            }
            Err(source) => {
                tracing::error!(
                    document = %document.id(),
                    path = %document.path().display(),
                    error = %source,
                    "Document upload failed"
                );
                document.mark_failed(source.to_string());
                return Err(RegistryError::Upload {
                    id: document.id(),
                    source,
                });
            }
        }
    }

    Registry::from_documents(documents)
}
