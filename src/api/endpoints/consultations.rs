//! Consultation endpoints under `/api/consultas`.
//!
//! Responses carry the linked professionals in full. Requests name them by
//! id in `ids_profissionais`; on update an absent list keeps the current
//! links and a present one replaces them.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;

use super::{created, not_found};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::consultations::ConsultationRequest;
use crate::db;
use crate::models::{Consultation, ConsultationId};

/// `GET /api/consultas`: newest first.
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Consultation>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(db::list_consultations(&conn)?))
}

/// `GET /api/consultas/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<Json<Consultation>, ApiError> {
    let id = ConsultationId::new(id)?;
    let conn = ctx.core.open_db()?;
    db::get_consultation(&conn, id)?
        .map(Json)
        .ok_or_else(|| not_found("Consultation", id))
}

/// `POST /api/consultas`
pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<ConsultationRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let draft = request.into_draft()?;

    let conn = ctx.core.open_db()?;
    let consultation = db::create_consultation(&conn, &draft)?;
    Ok(created(
        format!("/api/consultas/{}", consultation.id),
        consultation,
    ))
}

/// `PUT /api/consultas/:id`: merged against the stored row under the write lock.
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
    payload: Result<Json<ConsultationRequest>, JsonRejection>,
) -> Result<Json<Consultation>, ApiError> {
    let id = ConsultationId::new(id)?;
    let Json(request) = payload?;

    let conn = ctx.core.open_db()?;
    let consultation = db::update_consultation_with(&conn, id, |existing| {
        request.merge_into(existing).map_err(ApiError::from)
    })?;
    Ok(Json(consultation))
}

/// `DELETE /api/consultas/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let id = ConsultationId::new(id)?;
    let conn = ctx.core.open_db()?;
    db::delete_consultation(&conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}
