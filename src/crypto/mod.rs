pub mod password;
pub mod token;

pub use password::*;
pub use token::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Wrong password")]
    WrongPassword,

    #[error("Corrupted password digest")]
    MalformedDigest,

    #[error("Token could not be issued: {0}")]
    TokenIssue(String),

    #[error("Invalid or expired token: {0}")]
    InvalidToken(String),
}
