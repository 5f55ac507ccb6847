//! Patient endpoints under `/api/paciente`.
//!
//! Password hashing runs on the blocking pool, before any write lock is
//! taken; everything else is a short SQLite call made inline.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;

use super::{created, not_found};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::{self, DatabaseError};
use crate::models::{Patient, PatientId};
use crate::patients::PatientRequest;
use crate::validation;

/// `GET /api/paciente`
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Patient>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(db::list_patients(&conn)?))
}

/// `GET /api/paciente/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<Json<Patient>, ApiError> {
    let id = PatientId::new(id)?;
    let conn = ctx.core.open_db()?;
    db::get_patient(&conn, id)?
        .map(Json)
        .ok_or_else(|| not_found("Patient", id))
}

/// `GET /api/paciente/cpf/:cpf`: formatting characters are accepted.
pub async fn by_cpf(
    State(ctx): State<ApiContext>,
    Path(cpf): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    let cpf = validation::digits_only(&cpf);
    if !validation::is_valid_cpf(&cpf) {
        return Err(ApiError::BadRequest("CPF must contain exactly 11 digits".into()));
    }
    let conn = ctx.core.open_db()?;
    db::find_patient_by_cpf(&conn, &cpf)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No patient registered with this CPF".into()))
}

/// `POST /api/paciente`
pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<PatientRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(mut request) = payload?;
    let iterations = ctx.core.password_iterations();
    let new = tokio::task::spawn_blocking(move || request.build_new_patient(iterations)).await??;

    let conn = ctx.core.open_db()?;
    if db::find_patient_by_cpf(&conn, &new.cpf)?.is_some() {
        return Err(ApiError::Conflict(
            "A patient with this CPF is already registered".into(),
        ));
    }
    let patient = db::create_patient(&conn, &new)?;
    tracing::info!(patient_id = %patient.id, "Patient registered");

    Ok(created(format!("/api/paciente/{}", patient.id), patient))
}

/// `PUT /api/paciente/:id`: absent fields keep their stored value.
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
    payload: Result<Json<PatientRequest>, JsonRejection>,
) -> Result<Json<Patient>, ApiError> {
    let id = PatientId::new(id)?;
    let Json(mut request) = payload?;

    let iterations = ctx.core.password_iterations();
    let update = tokio::task::spawn_blocking(move || request.into_update(iterations)).await??;

    let conn = ctx.core.open_db()?;
    let patient = db::update_patient_with(&conn, id, |existing| {
        Ok::<_, DatabaseError>(update.apply(existing))
    })?;
    Ok(Json(patient))
}

/// `DELETE /api/paciente/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let id = PatientId::new(id)?;
    let conn = ctx.core.open_db()?;
    db::delete_patient(&conn, id)?;
    tracing::info!(patient_id = %id, "Patient deleted");
    Ok(StatusCode::NO_CONTENT)
}
