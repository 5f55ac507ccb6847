//! Password digests for patient credentials.
//!
//! Stored format: `pbkdf2-sha256$<iterations>$<salt b64>$<hash b64>`. The
//! iteration count travels with the digest, so raising the default does not
//! invalidate existing passwords.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::CryptoError;

pub const PBKDF2_ITERATIONS: u32 = 600_000;
pub const HASH_LENGTH: usize = 32;
pub const SALT_LENGTH: usize = 16;

const SCHEME: &str = "pbkdf2-sha256";

/// Generate a cryptographically random salt
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> Zeroizing<[u8; HASH_LENGTH]> {
    let mut out = Zeroizing::new([0u8; HASH_LENGTH]);
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out[..]);
    out
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str, iterations: u32) -> String {
    let salt = generate_salt();
    let hash = derive(password, &salt, iterations);
    format!(
        "{SCHEME}${iterations}${}${}",
        STANDARD.encode(salt),
        STANDARD.encode(&hash[..])
    )
}

/// Check a password against a stored digest in constant time.
///
/// `Ok(())` on match, `WrongPassword` on mismatch, `MalformedDigest` when the
/// stored value cannot be parsed.
pub fn verify_password(password: &str, digest: &str) -> Result<(), CryptoError> {
    let mut parts = digest.split('$');
    let (Some(SCHEME), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(CryptoError::MalformedDigest);
    };

    let iterations: u32 = iterations
        .parse()
        .map_err(|_| CryptoError::MalformedDigest)?;
    if iterations == 0 {
        return Err(CryptoError::MalformedDigest);
    }
    let salt = STANDARD
        .decode(salt)
        .map_err(|_| CryptoError::MalformedDigest)?;
    let expected = STANDARD
        .decode(expected)
        .map_err(|_| CryptoError::MalformedDigest)?;

    let actual = derive(password, &salt, iterations);
    if actual[..].ct_eq(&expected[..]).unwrap_u8() == 0 {
        return Err(CryptoError::WrongPassword);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: u32 = 1_000;

    #[test]
    fn hash_then_verify() {
        let digest = hash_password("abc123", FAST);
        assert!(digest.starts_with("pbkdf2-sha256$1000$"));
        assert!(verify_password("abc123", &digest).is_ok());
    }

    #[test]
    fn wrong_password_rejected() {
        let digest = hash_password("abc123", FAST);
        assert!(matches!(
            verify_password("abc124", &digest),
            Err(CryptoError::WrongPassword)
        ));
    }

    #[test]
    fn same_password_gets_different_salts() {
        let a = hash_password("abc123", FAST);
        let b = hash_password("abc123", FAST);
        assert_ne!(a, b);
    }

    #[test]
    fn digest_does_not_contain_plaintext() {
        let digest = hash_password("segredo1", FAST);
        assert!(!digest.contains("segredo1"));
    }

    #[test]
    fn malformed_digests_are_reported() {
        for bad in [
            "",
            "plain-text",
            "md5$1000$AAAA$AAAA",
            "pbkdf2-sha256$zero$AAAA$AAAA",
            "pbkdf2-sha256$0$AAAA$AAAA",
            "pbkdf2-sha256$1000$!!!$AAAA",
            "pbkdf2-sha256$1000$AAAA$AAAA$extra",
        ] {
            assert!(
                matches!(verify_password("x", bad), Err(CryptoError::MalformedDigest)),
                "accepted {bad:?}"
            );
        }
    }
}
