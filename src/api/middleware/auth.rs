//! Bearer token authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, validates the signature, issuer
//! and expiry, and injects `PatientContext` into request extensions for
//! downstream handlers.

use axum::extract::State;
use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, PatientContext};
use crate::crypto::PATIENT_GROUP;

/// Require a valid patient token.
pub async fn require_auth(
    State(ctx): State<ApiContext>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    match require_auth_inner(ctx, req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    ctx: ApiContext,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&req).ok_or(ApiError::Unauthorized)?;

    let claims = ctx.core.tokens().validate(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        ApiError::from(e)
    })?;
    if !claims.groups.iter().any(|g| g == PATIENT_GROUP) {
        return Err(ApiError::Unauthorized);
    }

    req.extensions_mut().insert(PatientContext::from(claims));

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert("Cache-Control", HeaderValue::from_static("no-store"));
    Ok(response)
}

fn bearer_token<B>(req: &Request<B>) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
