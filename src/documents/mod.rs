//! Fixed document set: identifiers, upload lifecycle, and the startup registry.

pub mod document;
pub mod registry;
pub mod uploader;

pub use document::{Document, DocumentId, DocumentState, UnknownDocument};
pub use registry::{RegisteredDocument, Registry, RegistryError, load_registry};
pub use uploader::{TEXT_MIME_TYPE, UploadError, upload, validate_source};
