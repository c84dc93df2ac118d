//! REST handlers for document and session management.
//!
//! These exist so a client can upload a document and open a session before
//! connecting the voice socket; the transcript endpoint serves history reads.

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::errors::app_error::{AppError, AppResult};
use crate::services::{DocumentRecord, MessageRecord, SessionRecord};
use crate::state::AppState;

pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    pub doc_text: String,
}

pub async fn create_document(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateDocumentRequest>,
) -> AppResult<Json<DocumentRecord>> {
    if request.doc_text.trim().is_empty() {
        return Err(AppError::BadRequest("doc_text must not be empty".into()));
    }
    let record = state.services.store.create_document(request.doc_text).await?;
    Ok(Json(record))
}

pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<DocumentRecord>> {
    state
        .services
        .store
        .get_document(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("document {id}")))
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub user_id: String,
    pub document_id: String,
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateSessionRequest>,
) -> AppResult<Json<SessionRecord>> {
    if state
        .services
        .store
        .get_document(&request.document_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound(format!(
            "document {}",
            request.document_id
        )));
    }
    let record = state
        .services
        .store
        .create_session(request.user_id, request.document_id)
        .await?;
    Ok(Json(record))
}

/// Full saved transcript for a session's document, oldest first.
pub async fn session_messages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<MessageRecord>>> {
    let session = state
        .services
        .store
        .get_session(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("session {id}")))?;
    let messages = state
        .services
        .store
        .messages_for_document(&session.document_id)
        .await?;
    Ok(Json(messages))
}
