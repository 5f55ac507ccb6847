use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;
use std::time::Duration;

use base64::Engine;
use thiserror::Error;

use crate::crypto::PBKDF2_ITERATIONS;
use crate::db::DEFAULT_BUSY_TIMEOUT;

/// Application-level constants
pub const APP_NAME: &str = "Clinica";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND_ADDR: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(127, 0, 0, 1), 8080));
pub const DEFAULT_JWT_ISSUER: &str = "clinica";
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 2;
pub const DATABASE_FILE: &str = "clinica.db";

// Environment variables
pub const ENV_DB_PATH: &str = "CLINICA_DB_PATH";
pub const ENV_BIND_ADDR: &str = "CLINICA_BIND_ADDR";
pub const ENV_JWT_SECRET: &str = "CLINICA_JWT_SECRET";
pub const ENV_JWT_ISSUER: &str = "CLINICA_JWT_ISSUER";
pub const ENV_TOKEN_TTL_HOURS: &str = "CLINICA_TOKEN_TTL_HOURS";
pub const ENV_BUSY_TIMEOUT_MS: &str = "CLINICA_BUSY_TIMEOUT_MS";
pub const ENV_PASSWORD_ITERATIONS: &str = "CLINICA_PASSWORD_ITERATIONS";

/// Get the application data directory: `~/Clinica/`.
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_NAME))
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "clinica_lib=info,clinica=info,tower_http=warn"
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot determine home directory; set {ENV_DB_PATH}")]
    NoHomeDir,

    #[error("Invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings, resolved once at startup.
#[derive(Clone)]
pub struct Settings {
    pub db_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub jwt_secret: Vec<u8>,
    pub jwt_issuer: String,
    pub token_ttl: chrono::Duration,
    pub busy_timeout: Duration,
    pub password_iterations: u32,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("db_path", &self.db_path)
            .field("bind_addr", &self.bind_addr)
            .field("jwt_issuer", &self.jwt_issuer)
            .field("token_ttl", &self.token_ttl)
            .field("busy_timeout", &self.busy_timeout)
            .field("password_iterations", &self.password_iterations)
            .finish_non_exhaustive()
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Resolve settings through `lookup`, falling back to defaults for
    /// anything it does not provide.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let db_path = match lookup(ENV_DB_PATH) {
            Some(path) => PathBuf::from(path),
            None => app_data_dir()
                .ok_or(ConfigError::NoHomeDir)?
                .join(DATABASE_FILE),
        };

        let bind_addr =
            parse_var(ENV_BIND_ADDR, lookup(ENV_BIND_ADDR))?.unwrap_or(DEFAULT_BIND_ADDR);

        let jwt_secret = match lookup(ENV_JWT_SECRET) {
            Some(secret) if secret.len() >= 16 => secret.into_bytes(),
            Some(secret) => {
                return Err(ConfigError::Invalid {
                    var: ENV_JWT_SECRET,
                    value: "<redacted>".into(),
                    reason: format!("must be at least 16 bytes, got {}", secret.len()),
                })
            }
            None => {
                tracing::warn!(
                    "{ENV_JWT_SECRET} not set; using a random secret, tokens will not survive a restart"
                );
                random_secret()
            }
        };

        let jwt_issuer = lookup(ENV_JWT_ISSUER).unwrap_or_else(|| DEFAULT_JWT_ISSUER.to_string());

        let ttl_hours: i64 = parse_var(ENV_TOKEN_TTL_HOURS, lookup(ENV_TOKEN_TTL_HOURS))?
            .unwrap_or(DEFAULT_TOKEN_TTL_HOURS);
        if ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                var: ENV_TOKEN_TTL_HOURS,
                value: ttl_hours.to_string(),
                reason: "must be positive".into(),
            });
        }

        let busy_timeout = parse_var::<u64>(ENV_BUSY_TIMEOUT_MS, lookup(ENV_BUSY_TIMEOUT_MS))?
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_BUSY_TIMEOUT);

        let password_iterations: u32 =
            parse_var(ENV_PASSWORD_ITERATIONS, lookup(ENV_PASSWORD_ITERATIONS))?
                .unwrap_or(PBKDF2_ITERATIONS);
        if password_iterations == 0 {
            return Err(ConfigError::Invalid {
                var: ENV_PASSWORD_ITERATIONS,
                value: "0".into(),
                reason: "must be positive".into(),
            });
        }

        Ok(Self {
            db_path,
            bind_addr,
            jwt_secret,
            jwt_issuer,
            token_ttl: chrono::Duration::hours(ttl_hours),
            busy_timeout,
            password_iterations,
        })
    }
}

/// Parse an optional variable; `None` when it is not set.
fn parse_var<T>(var: &'static str, raw: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = raw else {
        return Ok(None);
    };
    match value.trim().parse::<T>() {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => Err(ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

fn random_secret() -> Vec<u8> {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::STANDARD
        .encode(bytes)
        .into_bytes()
}
