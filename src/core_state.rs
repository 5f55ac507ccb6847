//! Application state shared by every request handler.
//!
//! Holds the resolved settings, the token issuer and a throwaway password
//! digest that login checks against when the CPF is unknown, so a miss costs
//! the same PBKDF2 work as a hit. Connections are not
//! pooled: each operation opens its own, so a request never shares a
//! transaction with another one.

use rusqlite::Connection;

use crate::config::Settings;
use crate::crypto::{hash_password, TokenIssuer};
use crate::db;

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    settings: Settings,
    tokens: TokenIssuer,
    dummy_digest: String,
}

impl CoreState {
    /// Build the state and make sure the database exists and is migrated.
    pub fn new(settings: Settings) -> Result<Self, CoreError> {
        db::open_database(&settings.db_path, settings.busy_timeout)?;
        tracing::info!(path = %settings.db_path.display(), "Database ready");

        let tokens = TokenIssuer::new(
            &settings.jwt_secret,
            settings.jwt_issuer.clone(),
            settings.token_ttl,
        );
        let dummy_digest = hash_password("unknown-patient", settings.password_iterations);
        Ok(Self {
            settings,
            tokens,
            dummy_digest,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// PBKDF2 rounds for new password digests.
    pub fn password_iterations(&self) -> u32 {
        self.settings.password_iterations
    }

    /// Digest with the configured cost that matches no patient's password.
    pub fn dummy_digest(&self) -> &str {
        &self.dummy_digest
    }

    /// Open a database connection for one operation.
    pub fn open_db(&self) -> Result<Connection, CoreError> {
        db::open_database(&self.settings.db_path, self.settings.busy_timeout)
            .map_err(CoreError::Database)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
}

/// Settings rooted in `dir`, with a fixed secret and cheap password hashing.
#[cfg(test)]
pub(crate) fn test_settings(dir: &std::path::Path) -> Settings {
    Settings::from_lookup(|var| match var {
        "CLINICA_DB_PATH" => Some(dir.join("clinica.db").display().to_string()),
        "CLINICA_JWT_SECRET" => Some("test-secret-of-reasonable-length".into()),
        "CLINICA_PASSWORD_ITERATIONS" => Some("1000".into()),
        _ => None,
    })
    .unwrap()
}
