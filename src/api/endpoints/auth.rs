//! Patient login and session endpoints.
//!
//! - `POST /api/auth/login`: exchange CPF + password for a bearer token
//! - `GET /api/auth/me`: the patient behind the presented token

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, PatientContext};
use crate::crypto::verify_password;
use crate::db;
use crate::models::Patient;
use crate::patients::LoginRequest;

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// `POST /api/auth/login`
pub async fn login(
    State(ctx): State<ApiContext>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(login) = payload?;
    let Some((cpf, _)) = login.credentials() else {
        return Err(ApiError::BadRequest("CPF and password are required".into()));
    };

    let patient = {
        let conn = ctx.core.open_db()?;
        db::find_patient_by_cpf(&conn, &cpf)?
    };

    // An unknown CPF is checked against the dummy digest so both paths pay
    // for one PBKDF2 derivation.
    let digest = patient
        .as_ref()
        .map_or_else(|| ctx.core.dummy_digest(), |p| p.password_digest.as_str())
        .to_owned();
    let verified = tokio::task::spawn_blocking(move || {
        verify_password(login.password.as_deref().unwrap_or_default(), &digest)
    })
    .await?;

    let patient = match (patient, verified) {
        (Some(patient), Ok(())) => patient,
        (None, _) => {
            tracing::info!("Login rejected: unknown CPF");
            return Err(ApiError::InvalidCredentials);
        }
        (Some(patient), Err(e)) => {
            tracing::info!(patient_id = %patient.id, "Login rejected: wrong password");
            return Err(e.into());
        }
    };

    let token = ctx.core.tokens().issue(&patient.cpf)?;
    tracing::info!(patient_id = %patient.id, "Patient logged in");
    Ok(Json(LoginResponse { token }))
}

/// `GET /api/auth/me`
pub async fn me(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<PatientContext>,
) -> Result<Json<Patient>, ApiError> {
    let conn = ctx.core.open_db()?;
    db::find_patient_by_cpf(&conn, &session.cpf)?
        .map(Json)
        .ok_or(ApiError::InvalidToken)
}
