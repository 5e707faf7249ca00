//! HTTP server for the vocabulary API

use super::handler::{
    create_vocabulary_handler, delete_property_handler, delete_term_handler, graph_handler, import_handler,
    list_vocabularies_handler, prefixes_handler, publication_handler, status_handler,
};
use crate::error::GroveResult;
use crate::persistence::PersistenceManager;
use crate::rdf::PrefixRegistry;
use crate::vocab::{Publisher, VocabStore};
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Everything a request handler can reach
pub struct AppState {
    pub store: RwLock<VocabStore>,
    pub registry: PrefixRegistry,
    pub publisher: Publisher,
    /// When Some, every mutation is checkpointed to disk
    pub persistence: Option<PersistenceManager>,
}

impl AppState {
    pub fn new(
        store: VocabStore,
        registry: PrefixRegistry,
        publisher: Publisher,
        persistence: Option<PersistenceManager>,
    ) -> Self {
        Self {
            store: RwLock::new(store),
            registry,
            publisher,
            persistence,
        }
    }

    /// Persist the store if persistence is configured
    pub fn checkpoint(&self, store: &VocabStore) -> GroveResult<()> {
        if let Some(persistence) = &self.persistence {
            persistence.checkpoint(store)?;
        }
        Ok(())
    }

    /// Apply `f` to a staged copy of `store` and checkpoint the copy. The
    /// live store only changes once both succeed.
    pub fn commit<T>(
        &self,
        store: &mut VocabStore,
        f: impl FnOnce(&mut VocabStore) -> GroveResult<T>,
    ) -> GroveResult<T> {
        commit_with(store, f, |staged| self.checkpoint(staged))
    }
}

fn commit_with<T>(
    store: &mut VocabStore,
    f: impl FnOnce(&mut VocabStore) -> GroveResult<T>,
    persist: impl FnOnce(&VocabStore) -> GroveResult<()>,
) -> GroveResult<T> {
    store.transaction(|staged| {
        let value = f(staged)?;
        persist(staged)?;
        Ok(value)
    })
}

/// API routes
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/status", get(status_handler))
        .route("/api/prefixes", get(prefixes_handler))
        .route("/api/vocabs", get(list_vocabularies_handler).post(create_vocabulary_handler))
        .route("/api/vocabs/import", post(import_handler))
        .route("/api/vocabs/:id/status", post(publication_handler))
        .route("/api/terms/:id", delete(delete_term_handler))
        .route("/api/properties/:id", delete(delete_property_handler))
        .route("/vocabs/:id/graph", get(graph_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// HTTP server
pub struct HttpServer {
    state: Arc<AppState>,
    address: String,
}

impl HttpServer {
    /// Create a new HTTP server bound to `address` (`host:port`)
    pub fn new(state: Arc<AppState>, address: impl Into<String>) -> Self {
        Self {
            state,
            address: address.into(),
        }
    }

    /// Start the HTTP server
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error>> {
        let app = router(Arc::clone(&self.state));

        let listener = tokio::net::TcpListener::bind(&self.address).await?;

        info!("Grove API available at http://{}", self.address);

        axum::serve(listener, app).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GroveError;
    use crate::vocab::{publication_state, PublicationState, VocabularyDetails};
    use tempfile::TempDir;

    const VOCAB: &str = "http://example.com/vocab/simple#";

    fn disk_full(_: &VocabStore) -> GroveResult<()> {
        Err(GroveError::Internal("disk full".to_string()))
    }

    #[test]
    fn test_failed_checkpoint_keeps_live_store() {
        let mut store = VocabStore::new();
        let result = commit_with(
            &mut store,
            |staged| Ok(staged.create_vocabulary(VOCAB, VocabularyDetails::derived_from(VOCAB))?),
            disk_full,
        );
        assert!(matches!(result, Err(GroveError::Internal(_))));
        assert_eq!(store.vocabulary_count(), 0);

        let id = commit_with(
            &mut store,
            |staged| Ok(staged.create_vocabulary(VOCAB, VocabularyDetails::derived_from(VOCAB))?),
            |_| Ok(()),
        )
        .unwrap();
        assert_eq!(store.vocabulary(id).unwrap().uri, VOCAB);
    }

    #[test]
    fn test_failed_checkpoint_leaves_publish_unstamped() {
        let out = TempDir::new().unwrap();
        let publisher = Publisher::new(out.path());
        let registry = PrefixRegistry::with_defaults();
        let mut store = VocabStore::new();
        let id = store
            .create_vocabulary(VOCAB, VocabularyDetails::derived_from(VOCAB))
            .unwrap();

        let result = commit_with(
            &mut store,
            |staged| Ok(publisher.publish(staged, id, &registry)?),
            disk_full,
        );
        assert!(result.is_err());
        assert!(store.vocabulary(id).unwrap().published.is_none());
        assert_eq!(publication_state(&store, id).unwrap(), PublicationState::Unpublished);
    }

    #[test]
    fn test_commit_without_persistence() {
        let out = TempDir::new().unwrap();
        let state = AppState::new(
            VocabStore::new(),
            PrefixRegistry::with_defaults(),
            Publisher::new(out.path()),
            None,
        );
        let mut store = VocabStore::new();
        state
            .commit(&mut store, |staged| {
                Ok(staged.create_vocabulary(VOCAB, VocabularyDetails::derived_from(VOCAB))?)
            })
            .unwrap();
        assert_eq!(store.vocabulary_count(), 1);
    }
}
