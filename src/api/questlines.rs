//! Questline CRUD and export handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use questlines_core::models::QuestlineInput;

use super::error::{AppError, AppResult};
use super::AppState;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Query parameters for the export endpoint.
#[derive(Debug, Deserialize)]
pub struct ExportParams {
    /// The bundled frontend sends `format`, scripted clients `fmt`.
    #[serde(alias = "format")]
    pub fmt: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
        }
    }
}

/// GET /questlines
#[tracing::instrument(skip_all)]
pub async fn list_questlines(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let infos = state.db.list_questline_infos()?;
    tracing::debug!(count = infos.len(), "Listed questlines");
    Ok(Json(infos))
}

/// POST /questlines
#[tracing::instrument(skip_all)]
pub async fn create_questline(
    State(state): State<AppState>,
    payload: Result<Json<QuestlineInput>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = payload?;
    let created = state.db.create_questline(&input)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /questlines/{id}
#[tracing::instrument(skip_all, fields(questline_id = %id))]
pub async fn get_questline(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(state.db.get_questline(&id)?))
}

/// PUT /questlines/{id}
///
/// The body must carry the same id as the path.
#[tracing::instrument(skip_all, fields(questline_id = %id))]
pub async fn update_questline(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<QuestlineInput>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = payload?;
    if input.id.as_deref() != Some(id.as_str()) {
        tracing::warn!(body_id = ?input.id, "Questline id mismatch");
        return Err(AppError::BadRequest(
            "ID mismatch between URL param and body".into(),
        ));
    }

    let updated = state.db.update_questline(&id, &input)?;
    Ok(Json(updated))
}

/// DELETE /questlines/{id}
#[tracing::instrument(skip_all, fields(questline_id = %id))]
pub async fn delete_questline(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.db.delete_questline(&id)?;
    Ok(Json(MessageResponse {
        message: "Questline deleted successfully".into(),
    }))
}

/// GET /questlines/{id}/export?fmt=json
///
/// Downloads the full aggregate as a file attachment. A missing format means
/// JSON. An unknown id is a 404 whatever format was asked for.
#[tracing::instrument(skip_all, fields(questline_id = %id, fmt = ?params.fmt))]
pub async fn export_questline(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ExportParams>,
) -> AppResult<impl IntoResponse> {
    let questline = state.db.get_questline(&id)?;

    let requested = params.fmt.as_deref().unwrap_or("json");
    let Some(format) = ExportFormat::from_str(requested) else {
        tracing::warn!("Unsupported export format");
        return Err(AppError::BadRequest(format!(
            "Unsupported format: {requested}"
        )));
    };

    let body = match format {
        ExportFormat::Json => serde_json::to_string_pretty(&questline).map_err(|e| {
            tracing::error!(error = %e, "Failed to serialize export");
            AppError::Internal(format!("Failed to serialize export: {e}"))
        })?,
    };

    let disposition = content_disposition(&questline.name, format.extension());
    tracing::info!(%disposition, "Exporting questline");

    Ok((
        [
            (CONTENT_TYPE, format.content_type().to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

/// RFC 5987 `attr-char`: everything else is percent-encoded.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// `attachment` disposition with an ASCII `filename` for old clients and the
/// exact UTF-8 name in `filename*`.
fn content_disposition(name: &str, extension: &str) -> String {
    let stem = attachment_stem(name);
    let exact = if name.trim().is_empty() { stem.as_str() } else { name };
    let encoded = utf8_percent_encode(exact, ATTR_CHAR);
    format!("attachment; filename=\"{stem}.{extension}\"; filename*=UTF-8''{encoded}.{extension}")
}

/// Questline name made safe for a quoted `Content-Disposition` filename.
fn attachment_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c == ' ' || c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect();

    if stem.trim().is_empty() {
        "questline".to_string()
    } else {
        stem
    }
}
