//! Query service tying the registry, provider, and metrics together.

use crate::documents::{DocumentId, Registry};
use crate::metrics::{MetricsSnapshot, QueryMetrics};
use crate::provider::ModelProvider;
use crate::query::dispatch::{DispatchError, dispatch};
use crate::query::mode::Mode;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// Validated request for one of the three modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    /// Operation to perform.
    pub mode: Mode,
    /// Caller supplied free text.
    pub query: String,
    /// Document the query runs against.
    pub document: DocumentId,
}

impl QueryRequest {
    /// Instruction text sent to the model for this request.
    pub fn instruction(&self) -> String {
        self.mode.instruction(&self.query)
    }
}

/// Public description of a registered document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    /// Identifier accepted in the `file` field.
    pub id: &'static str,
    /// Local file name.
    pub file_name: &'static str,
    /// Provider resource name.
    pub remote_name: String,
}

/// Abstraction over query execution used by the HTTP surface.
#[async_trait]
pub trait QueryApi: Send + Sync {
    /// Run a validated query and return the model's text.
    async fn run(&self, request: QueryRequest) -> Result<String, DispatchError>;

    /// Describe the registered documents.
    fn documents(&self) -> Vec<DocumentSummary>;

    /// Retrieve the current metrics snapshot.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

/// Runs queries against the documents registered at startup.
///
/// Holds the immutable [`Registry`] produced by
/// [`load_registry`](crate::documents::load_registry); construct once and share through an
/// `Arc`.
pub struct QueryService {
    provider: Arc<dyn ModelProvider>,
    registry: Registry,
    metrics: QueryMetrics,
}

impl QueryService {
    /// Build a service over an already loaded registry.
    pub fn new(provider: Arc<dyn ModelProvider>, registry: Registry) -> Self {
        Self {
            provider,
            registry,
            metrics: QueryMetrics::new(),
        }
    }

    /// Registry backing this service.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

#[async_trait]
impl QueryApi for QueryService {
    async fn run(&self, request: QueryRequest) -> Result<String, DispatchError> {
        let document = self.registry.get(request.document);
        let instruction = request.instruction();
        tracing::info!(
            mode = request.mode.label(),
            file = %request.document,
            character = request.mode.character().map(|c| c.name()),
            query = %request.query,
            "Running query"
        );

        let result = dispatch(
            self.provider.as_ref(),
            &instruction,
            std::slice::from_ref(&document.remote),
        )
        .await;

        match &result {
            Ok(text) => {
                self.metrics.record_success(request.mode);
                tracing::debug!(
                    mode = request.mode.label(),
                    file = %request.document,
                    chars = text.len(),
                    "Query completed"
                );
            }
            Err(error) => {
                self.metrics.record_failure(request.mode);
                tracing::error!(
                    mode = request.mode.label(),
                    file = %request.document,
                    character = request.mode.character().map(|c| c.name()),
                    query = %request.query,
                    error = %error,
                    "Query failed"
                );
            }
        }
        result
    }

    fn documents(&self) -> Vec<DocumentSummary> {
        self.registry
            .iter()
            .map(|document| DocumentSummary {
                id: document.id.as_str(),
                file_name: document.id.file_name(),
                remote_name: document.remote.name.clone(),
            })
            .collect()
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PollPolicy;
    use crate::documents::load_registry;
    use crate::provider::testing::{GenerateScript, ScriptedProvider};
    use crate::provider::GenerateResponse;
    use crate::query::Character;
    use std::time::Duration;

    async fn service_with(provider: ScriptedProvider) -> (QueryService, Arc<ScriptedProvider>) {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in ["a.txt", "b.txt", "c.txt"] {
            std::fs::write(dir.path().join(name), "text").expect("fixture");
        }
        let provider = Arc::new(provider);
        let registry = load_registry(
            provider.as_ref(),
            dir.path(),
            PollPolicy {
                interval: Duration::from_millis(1),
                max_polls: 1,
            },
        )
        .await
        .expect("registry");
        (QueryService::new(provider.clone(), registry), provider)
    }

    #[tokio::test]
    async fn routes_query_to_selected_document() {
        let (service, provider) = service_with(ScriptedProvider::new()).await;

        let text = service
            .run(QueryRequest {
                mode: Mode::Redact {
                    character: Character::Hermione,
                },
                query: "hide her".into(),
                document: DocumentId::C,
            })
            .await
            .expect("text");

        assert_eq!(text, "generated");
        let calls = provider.recorded_generate_calls();
        assert_eq!(calls[0].file_names, vec!["files/c-txt"]);
        assert_eq!(
            calls[0].instruction,
            "Redact all instances of Hermione's name in the following text: hide her"
        );
        assert_eq!(service.metrics_snapshot().redact.completed, 1);
    }

    #[tokio::test]
    async fn failures_are_counted_and_propagated() {
        let (service, _) = service_with(
            ScriptedProvider::new().with_generate(GenerateScript::Respond(
                GenerateResponse::default(),
            )),
        )
        .await;

        let error = service
            .run(QueryRequest {
                mode: Mode::Extract,
                query: "plot".into(),
                document: DocumentId::A,
            })
            .await
            .expect_err("no candidates");
        assert!(matches!(error, DispatchError::NoCandidates));
        assert_eq!(service.metrics_snapshot().extract.failed, 1);
    }

    #[tokio::test]
    async fn documents_are_listed_in_registry_order() {
        let (service, _) = service_with(ScriptedProvider::new()).await;
        let ids: Vec<_> = service.documents().iter().map(|doc| doc.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(service.registry().get(DocumentId::A).remote.name, "files/a-txt");
    }
}
