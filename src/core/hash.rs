//! Password hashing, digests and random values

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::Rng;
use rand::distributions::{Alphanumeric, Uniform};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("malformed password hash: {0}")]
    MalformedHash(String),
}

/// Hash a password with Argon2id and a random salt
///
/// The result is a self-describing PHC string, so the parameters travel with it.
pub fn generate_password_hash(password: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| HashError::Hashing(err.to_string()))
}

/// Work factor of [`generate_bcrypt_hash`]
pub const BCRYPT_COST: u32 = 10;

/// Hash a password with bcrypt, for stores whose other readers only know `$2b$`
pub fn generate_bcrypt_hash(password: &str) -> Result<String, HashError> {
    bcrypt::hash(password, BCRYPT_COST).map_err(|err| HashError::Hashing(err.to_string()))
}

/// Check a password against an Argon2 PHC string or a `$2a$`/`$2b$`/`$2y$` bcrypt hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, HashError> {
    if hash.starts_with("$2") {
        return bcrypt::verify(password, hash)
            .map_err(|err| HashError::MalformedHash(err.to_string()));
    }

    let parsed = PasswordHash::new(hash).map_err(|err| HashError::MalformedHash(err.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Lowercase hex SHA-1 of `input`, for legacy checksums only
pub fn sha1_hex(input: &str) -> String {
    hex::encode(Sha1::digest(input.as_bytes()))
}

/// Lowercase hex SHA-256 of `input`
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Lowercase hex SHA-512 of `input`
pub fn sha512_hex(input: &str) -> String {
    hex::encode(Sha512::digest(input.as_bytes()))
}

/// Opaque 64-character token
pub fn generate_random_token() -> String {
    let seed = format!(
        "{}{}",
        chrono::Utc::now().timestamp_millis(),
        generate_random_string(64)
    );
    sha256_hex(&seed)
}

/// `length` random decimal digits, e.g. for one-time codes
pub fn generate_random_code(length: usize) -> String {
    let digits = Uniform::new_inclusive(b'0', b'9');
    rand::thread_rng()
        .sample_iter(digits)
        .take(length)
        .map(char::from)
        .collect()
}

/// `length` random ASCII letters and digits
pub fn generate_random_string(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha1() {
        assert_eq!(sha1_hex("abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
        assert_eq!(sha1_hex("123456"), "7c4a8d09ca3762af61e59520943dc26494f8941b");
    }

    #[test]
    fn test_sha256() {
        assert_eq!(
            sha256_hex("123456"),
            "8d969eef6ecad3c29a3a629280e686cf0c3f5d5a86aff3ca12020c923adc6c92"
        );
    }

    #[test]
    fn test_sha512() {
        assert_eq!(
            sha512_hex("123456"),
            "ba3253876aed6bc22d4a6ff53d8406c6ad864195ed144ab5c87621b6c233b548baeae6956df346ec8c17f5ea10f35ee3cbc514797ed7ddd3145464e2a0bab413"
        );
    }

    #[test]
    fn test_password_hash_verifies() {
        let hash = generate_password_hash("123456").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("123456", &hash).unwrap());
        assert!(!verify_password("1234567", &hash).unwrap());
    }

    #[test]
    fn test_password_hash_is_salted() {
        let a = generate_password_hash("123456").unwrap();
        let b = generate_password_hash("123456").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_existing_bcrypt_hashes() {
        let cost_10 = "$2b$10$abcdefghijklmnopqrstuuxD0vCwu/f2ahNVJLL35ZYA2xuiRyPH6";
        assert!(verify_password("123456", cost_10).unwrap());
        assert!(!verify_password("1234567", cost_10).unwrap());

        let legacy = "$2a$06$If6bvum7DFjUnE9p2uDeDu0YHzrHM6tf.iqN8.yx.jNN1ILEf7h0i";
        assert!(verify_password("abc", legacy).unwrap());
    }

    #[test]
    fn test_bcrypt_hash_verifies() {
        let hash = generate_bcrypt_hash("123456").unwrap();
        assert!(hash.starts_with("$2b$10$"));
        assert!(verify_password("123456", &hash).unwrap());
        assert!(!verify_password("654321", &hash).unwrap());
    }

    #[test]
    fn test_verify_truncated_bcrypt_hash() {
        assert!(matches!(
            verify_password("123456", "$2b$10$short"),
            Err(HashError::MalformedHash(_))
        ));
    }

    #[test]
    fn test_verify_malformed_hash() {
        assert!(matches!(
            verify_password("123456", "not-a-hash"),
            Err(HashError::MalformedHash(_))
        ));
    }

    #[test]
    fn test_random_code_is_digits() {
        let code = generate_random_code(6);
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_random_string_is_alphanumeric() {
        let value = generate_random_string(32);
        assert_eq!(value.len(), 32);
        assert!(value.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_random_token_shape() {
        let token = generate_random_token();
        assert_eq!(token.len(), 64);
        assert_ne!(token, generate_random_token());
    }
}
