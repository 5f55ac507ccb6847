//! Professional endpoints under `/api/profissionais`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;

use super::{created, not_found};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::models::{Professional, ProfessionalId};
use crate::professionals::{parse_license_number, ProfessionalRequest};

/// `GET /api/profissionais`
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Professional>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(db::list_professionals(&conn)?))
}

/// `GET /api/profissionais/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<Json<Professional>, ApiError> {
    let id = ProfessionalId::new(id)?;
    let conn = ctx.core.open_db()?;
    db::get_professional(&conn, id)?
        .map(Json)
        .ok_or_else(|| not_found("Professional", id))
}

/// `GET /api/profissionais/crm/:crm`
pub async fn by_license(
    State(ctx): State<ApiContext>,
    Path(crm): Path<i64>,
) -> Result<Json<Professional>, ApiError> {
    let license_number = parse_license_number(crm)?;
    let conn = ctx.core.open_db()?;
    db::find_professional_by_license(&conn, license_number)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No professional with license {license_number}")))
}

/// `POST /api/profissionais`
pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<ProfessionalRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let new = request.into_new()?;

    let conn = ctx.core.open_db()?;
    if db::find_professional_by_license(&conn, new.license_number)?.is_some() {
        return Err(ApiError::Conflict(format!(
            "License number {} is already registered",
            new.license_number
        )));
    }
    let professional = db::create_professional(&conn, &new)?;
    tracing::info!(professional_id = %professional.id, "Professional registered");

    Ok(created(
        format!("/api/profissionais/{}", professional.id),
        professional,
    ))
}

/// `PUT /api/profissionais/:id`: absent fields keep their stored value.
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
    payload: Result<Json<ProfessionalRequest>, JsonRejection>,
) -> Result<Json<Professional>, ApiError> {
    let id = ProfessionalId::new(id)?;
    let Json(request) = payload?;

    let conn = ctx.core.open_db()?;
    let professional = db::update_professional_with(&conn, id, |existing| {
        request.merge_into(existing).map_err(ApiError::from)
    })?;
    Ok(Json(professional))
}

/// `DELETE /api/profissionais/:id`: refused while any consultation links it.
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let id = ProfessionalId::new(id)?;
    let conn = ctx.core.open_db()?;
    db::delete_professional(&conn, id)?;
    tracing::info!(professional_id = %id, "Professional deleted");
    Ok(StatusCode::NO_CONTENT)
}
