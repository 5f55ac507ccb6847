//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub tables: i64,
    pub version: &'static str,
}

/// `GET /api/health`: liveness plus a round trip to the database.
pub async fn check(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let tables = db::count_tables(&conn)?;

    Ok(Json(HealthResponse {
        status: "ok",
        tables,
        version: crate::config::APP_VERSION,
    }))
}
