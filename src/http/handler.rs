//! HTTP handlers for the vocabulary API

use super::server::AppState;
use crate::error::{GroveError, GroveResult};
use crate::rdf::{Namespace, RdfFormat};
use crate::vocab::{
    has_updated, import_vocabulary, serialize_vocabulary, ImportCounters, PropertyId, TermId, VocabStore,
    VocabularyDetails, VocabularyId,
};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// Error response: `{"error": message}` with the matching status code
pub struct ApiError(GroveError);

impl<E: Into<GroveError>> From<E> for ApiError {
    fn from(e: E) -> Self {
        ApiError(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            warn!("Request failed: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// One row of the vocabulary list
#[derive(Debug, Serialize)]
pub struct VocabularySummary {
    pub id: VocabularyId,
    pub uri: String,
    pub label: String,
    pub description: String,
    pub preferred_prefix: String,
    pub term_count: usize,
    pub is_published: bool,
    pub has_updated: bool,
}

impl VocabularySummary {
    fn of(store: &VocabStore, id: VocabularyId) -> GroveResult<Self> {
        let vocabulary = store.vocabulary(id)?;
        Ok(Self {
            id,
            uri: vocabulary.uri.clone(),
            label: vocabulary.label.clone(),
            description: vocabulary.description.clone(),
            preferred_prefix: vocabulary.preferred_prefix.clone(),
            term_count: store.term_count(id),
            is_published: vocabulary.is_published(),
            has_updated: has_updated(store, id)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct NewVocabulary {
    pub uri: String,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub vocabulary: VocabularySummary,
    pub is_new: bool,
    pub counters: ImportCounters,
}

#[derive(Debug, Deserialize)]
pub struct GraphParams {
    pub format: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub publish: bool,
}

/// Handler for system status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = state.store.read().await;
    Json(json!({
        "status": "healthy",
        "version": crate::VERSION,
        "storage": {
            "vocabularies": store.vocabulary_count(),
            "predicates": store.predicates().count(),
            "properties": store.property_count(false),
            "persistent": state.persistence.is_some(),
        }
    }))
}

/// Known namespace prefixes, sorted by prefix
pub async fn prefixes_handler(State(state): State<Arc<AppState>>) -> Json<Vec<Namespace>> {
    Json(state.registry.sorted())
}

pub async fn list_vocabularies_handler(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<VocabularySummary>>> {
    let store = state.store.read().await;
    let summaries = store
        .vocabularies()
        .map(|v| VocabularySummary::of(&store, v.id))
        .collect::<GroveResult<Vec<_>>>()?;
    Ok(Json(summaries))
}

/// Create an empty vocabulary labelled after its URI
pub async fn create_vocabulary_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewVocabulary>,
) -> ApiResult<(StatusCode, Json<VocabularySummary>)> {
    let mut store = state.store.write().await;
    let id = state.commit(&mut store, |staged| {
        Ok(staged.create_vocabulary(&payload.uri, VocabularyDetails::derived_from(&payload.uri))?)
    })?;
    Ok((StatusCode::CREATED, Json(VocabularySummary::of(&store, id)?)))
}

/// Multipart form with `uri`, `rdf_format` and `file` fields
pub async fn import_handler(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> ApiResult<Response> {
    let mut uri = None;
    let mut rdf_format = None;
    let mut source = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| GroveError::Validation(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        debug!("Import field {:?} (file name {:?})", name, field.file_name());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| GroveError::Validation(format!("Multipart error: {}", e)))?;
        let text = String::from_utf8(bytes.to_vec())
            .map_err(|_| GroveError::Validation(format!("{} is not valid UTF-8", name)))?;
        match name.as_str() {
            "uri" => uri = Some(text.trim().to_string()),
            "rdf_format" => rdf_format = Some(text.trim().to_string()),
            "file" => source = Some(text),
            _ => {}
        }
    }

    let missing = |field: &str| GroveError::Validation(format!("Missing field: {}", field));
    let uri = uri.ok_or_else(|| missing("uri"))?;
    let rdf_format = rdf_format.ok_or_else(|| missing("rdf_format"))?;
    let source = source.ok_or_else(|| missing("file"))?;

    let mut store = state.store.write().await;
    let outcome = state.commit(&mut store, |staged| {
        Ok(import_vocabulary(staged, &source, &uri, &rdf_format)?)
    })?;

    let status = if outcome.is_new {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let body = ImportResponse {
        vocabulary: VocabularySummary::of(&store, outcome.vocabulary_id)?,
        is_new: outcome.is_new,
        counters: outcome.counters,
    };
    Ok((status, Json(body)).into_response())
}

/// The vocabulary serialized as `?format=` (JSON-LD by default)
pub async fn graph_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Query(params): Query<GraphParams>,
) -> ApiResult<Response> {
    let format = RdfFormat::from_alias(params.format.as_deref().unwrap_or("json-ld"))?;
    let store = state.store.read().await;
    let document = serialize_vocabulary(&store, VocabularyId::new(id), &state.registry, format)?;
    Ok(([(header::CONTENT_TYPE, format.content_type())], document).into_response())
}

/// `{"publish": true}` publishes, `{"publish": false}` unpublishes
pub async fn publication_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<PublishRequest>,
) -> ApiResult<Json<VocabularySummary>> {
    let id = VocabularyId::new(id);
    let mut store = state.store.write().await;
    state.commit(&mut store, |staged| {
        if payload.publish {
            state.publisher.publish(staged, id, &state.registry)?;
        } else {
            state.publisher.unpublish(staged, id)?;
        }
        Ok(())
    })?;
    Ok(Json(VocabularySummary::of(&store, id)?))
}

/// Soft-delete a term and its properties
pub async fn delete_term_handler(State(state): State<Arc<AppState>>, Path(id): Path<u64>) -> ApiResult<StatusCode> {
    let mut store = state.store.write().await;
    state.commit(&mut store, |staged| Ok(staged.delete_term(TermId::new(id))?))?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_property_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> ApiResult<StatusCode> {
    let mut store = state.store.write().await;
    state.commit(&mut store, |staged| Ok(staged.delete_property(PropertyId::new(id))?))?;
    Ok(StatusCode::NO_CONTENT)
}
