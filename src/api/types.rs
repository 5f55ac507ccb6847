//! Shared types for the HTTP layer.

use std::sync::Arc;

use crate::core_state::CoreState;
use crate::crypto::Claims;

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}

// ═══════════════════════════════════════════════════════════
// Patient context: injected by auth middleware
// ═══════════════════════════════════════════════════════════

/// Authenticated patient, inserted into request extensions once the
/// bearer token has been validated.
#[derive(Debug, Clone)]
pub struct PatientContext {
    /// CPF of the patient the token was issued to.
    pub cpf: String,
    pub groups: Vec<String>,
    pub expires_at: i64,
}

impl From<Claims> for PatientContext {
    fn from(claims: Claims) -> Self {
        Self {
            cpf: claims.sub,
            groups: claims.groups,
            expires_at: claims.exp,
        }
    }
}
