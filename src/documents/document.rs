//! Document identifiers and the per-document upload lifecycle.

use crate::provider::RemoteFile;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Identifier accepted from callers that does not name a registered document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid file name: {0}. Must be a, b, or c.")]
pub struct UnknownDocument(pub String);

/// One of the three fixed documents served by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentId {
    /// `a.txt`
    A,
    /// `b.txt`
    B,
    /// `c.txt`
    C,
}

impl DocumentId {
    /// Every identifier in registry order.
    pub const ALL: [Self; 3] = [Self::A, Self::B, Self::C];

    /// Position of the document in the registry.
    pub const fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
        }
    }

    /// Lower-case identifier as accepted on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "a",
            Self::B => "b",
            Self::C => "c",
        }
    }

    /// Local file name backing the document.
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::A => "a.txt",
            Self::B => "b.txt",
            Self::C => "c.txt",
        }
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentId {
    type Err = UnknownDocument;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "a" => Ok(Self::A),
            "b" => Ok(Self::B),
            "c" => Ok(Self::C),
            _ => Err(UnknownDocument(s.to_string())),
        }
    }
}

/// Upload lifecycle of a document during startup.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentState {
    /// Not yet submitted.
    Pending,
    /// Submitted and waiting for the provider.
    Uploading,
    /// Ready to be referenced by queries.
    Active(RemoteFile),
    /// Upload or processing failed with the given reason.
    Failed(String),
}

impl DocumentState {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Uploading => "uploading",
            Self::Active(_) => "active",
            Self::Failed(_) => "failed",
        }
    }
}

/// A local text file and its provider-side counterpart.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    id: DocumentId,
    path: PathBuf,
    state: DocumentState,
}

impl Document {
    /// New pending document resolved inside `dir`.
    pub fn new(id: DocumentId, dir: &Path) -> Self {
        Self {
            id,
            path: dir.join(id.file_name()),
            state: DocumentState::Pending,
        }
    }

    /// Identifier of the document.
    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// Local path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current lifecycle state.
    pub fn state(&self) -> &DocumentState {
        &self.state
    }

    /// Provider handle, available once the document is active.
    pub fn remote(&self) -> Option<&RemoteFile> {
        match &self.state {
            DocumentState::Active(file) => Some(file),
            _ => None,
        }
    }

    /// Whether queries may reference the document.
    pub fn is_active(&self) -> bool {
        matches!(self.state, DocumentState::Active(_))
    }

    pub(crate) fn mark_uploading(&mut self) {
        self.transition(DocumentState::Uploading);
    }

    pub(crate) fn mark_active(&mut self, file: RemoteFile) {
        self.transition(DocumentState::Active(file));
    }

    pub(crate) fn mark_failed(&mut self, reason: impl Into<String>) {
        self.transition(DocumentState::Failed(reason.into()));
    }

    fn transition(&mut self, next: DocumentState) {
        tracing::debug!(
            document = %self.id,
            from = self.state.label(),
            to = next.label(),
            "Document state changed"
        );
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::FileState;

    #[test]
    fn identifiers_parse_case_insensitively() {
        assert_eq!("a".parse::<DocumentId>(), Ok(DocumentId::A));
        assert_eq!("B".parse::<DocumentId>(), Ok(DocumentId::B));
        assert_eq!("c".parse::<DocumentId>(), Ok(DocumentId::C));
    }

    #[test]
    fn unknown_identifier_names_the_value() {
        let error = "d".parse::<DocumentId>().unwrap_err();
        assert_eq!(error, UnknownDocument("d".into()));
        assert!(error.to_string().contains("Invalid file name: d"));
        assert!(" a".parse::<DocumentId>().is_err());
    }

    #[test]
    fn identifiers_map_to_registry_positions() {
        let indices: Vec<_> = DocumentId::ALL.iter().map(|id| id.index()).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(DocumentId::B.file_name(), "b.txt");
    }

    #[test]
    fn document_exposes_handle_only_when_active() {
        let mut document = Document::new(DocumentId::A, Path::new("/srv/docs"));
        assert_eq!(document.path(), Path::new("/srv/docs/a.txt"));
        assert_eq!(document.state(), &DocumentState::Pending);

        document.mark_uploading();
        assert!(document.remote().is_none());

        let file = RemoteFile {
            name: "files/a".into(),
            display_name: Some("a.txt".into()),
            mime_type: "text/plain".into(),
            uri: "https://files.test/a".into(),
            state: FileState::Active,
        };
        document.mark_active(file.clone());
        assert!(document.is_active());
        assert_eq!(document.remote(), Some(&file));
    }
}
