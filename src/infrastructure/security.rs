use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, TimeDelta, Utc};
use rand_core::{OsRng, RngCore};
use thiserror::Error;
use tokio::task::{self, JoinError};
use tracing::{debug, instrument, trace};

// Argon2 parameters for 50-150ms target latency
const ARGON2_M_COST: u32 = 19456; // 19 MB
const ARGON2_T_COST: u32 = 2; // 2 iterations
const ARGON2_P_COST: u32 = 1; // 1 parallelism

/// Bytes of entropy in each half of a reset token.
const RESET_TOKEN_FRAGMENT_BYTES: usize = 16;

pub const DEFAULT_RESET_TOKEN_EXPIRY_MINUTES: i64 = 30;

#[derive(Error, Debug)]
pub enum SecurityError {
    #[error("Password hashing failed: {0}")]
    Hash(String),
    #[error("Blocking task failed: {0}")]
    Task(#[from] JoinError),
}

fn argon2() -> Result<Argon2<'static>, SecurityError> {
    let params = argon2::Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, None)
        .map_err(|e| SecurityError::Hash(e.to_string()))?;
    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

/// Hashes `password` with Argon2id and a fresh random salt.
///
/// The work runs on the blocking pool, so awaiting this never stalls the
/// executor thread serving other requests.
#[instrument(skip_all)]
pub async fn hash_password(password: &str) -> Result<String, SecurityError> {
    let password = password.to_owned();
    let hash = task::spawn_blocking(move || -> Result<String, SecurityError> {
        let salt = SaltString::generate(&mut OsRng);
        argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| SecurityError::Hash(e.to_string()))
    })
    .await??;
    debug!("Password hashed");
    Ok(hash)
}

/// Checks `password` against a PHC-formatted `hash`.
///
/// A mismatch is `Ok(false)`. Only a hash string that cannot be parsed at all
/// is an error.
#[instrument(skip_all)]
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, SecurityError> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    let matches = task::spawn_blocking(move || {
        let parsed_hash =
            PasswordHash::new(&hash).map_err(|e| SecurityError::Hash(e.to_string()))?;
        Ok::<_, SecurityError>(
            argon2()?
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok(),
        )
    })
    .await??;
    trace!(matches, "Password verified");
    Ok(matches)
}

/// Builds a password-reset token from two independent OS-random fragments.
pub fn generate_reset_token() -> String {
    let mut token = random_fragment();
    token.push_str(&random_fragment());
    token
}

fn random_fragment() -> String {
    let mut buffer = [0u8; RESET_TOKEN_FRAGMENT_BYTES];
    OsRng.fill_bytes(&mut buffer);
    URL_SAFE_NO_PAD.encode(buffer)
}

pub fn is_token_expired(created_at: DateTime<Utc>) -> bool {
    is_token_expired_after(created_at, DEFAULT_RESET_TOKEN_EXPIRY_MINUTES)
}

pub fn is_token_expired_after(created_at: DateTime<Utc>, expiry_minutes: i64) -> bool {
    is_token_expired_at(created_at, Utc::now(), expiry_minutes)
}

/// A token is expired once strictly more than `expiry_minutes` have passed
/// between `created_at` and `now`.
///
/// Thresholds too large to represent as a `TimeDelta` never expire; too
/// negative ones always have.
pub fn is_token_expired_at(
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
    expiry_minutes: i64,
) -> bool {
    match TimeDelta::try_minutes(expiry_minutes) {
        Some(threshold) => now.signed_duration_since(created_at) > threshold,
        None => expiry_minutes < 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_password_generates_valid_hash() {
        let password = "test_password_123";
        let hash = hash_password(password).await.unwrap();

        assert!(!hash.is_empty());
        assert_ne!(hash, password);
        // Hash should start with $argon2id$ (Argon2id format)
        assert!(hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_hash_password_same_password_produces_different_hashes() {
        let password = "same_password";

        let hash1 = hash_password(password).await.unwrap();
        let hash2 = hash_password(password).await.unwrap();

        // Due to random salt, same password should produce different hashes
        assert_ne!(hash1, hash2);
    }

    #[tokio::test]
    async fn test_verify_password_correct_password_returns_true() {
        let password = "correct_password";
        let hash = hash_password(password).await.unwrap();

        assert!(verify_password(password, &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_password_incorrect_password_returns_false() {
        let hash = hash_password("correct_password").await.unwrap();

        let result = verify_password("wrong_password", &hash).await.unwrap();
        assert!(!result);
    }

    #[tokio::test]
    async fn test_verify_password_invalid_hash_format() {
        let result = verify_password("test_password", "not_a_valid_hash").await;
        assert!(matches!(result, Err(SecurityError::Hash(_))));
    }

    #[tokio::test]
    async fn test_verify_password_with_empty_password() {
        let hash = hash_password("").await.unwrap();

        assert!(verify_password("", &hash).await.unwrap());
        assert!(!verify_password(" ", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_password_with_unicode() {
        let password = "пароль123";
        let hash = hash_password(password).await.unwrap();

        assert!(verify_password(password, &hash).await.unwrap());
        assert!(!verify_password("пароль124", &hash).await.unwrap());
    }

    #[test]
    fn test_reset_tokens_differ() {
        let token1 = generate_reset_token();
        let token2 = generate_reset_token();

        assert_ne!(token1, token2);
    }

    #[test]
    fn test_reset_token_is_url_safe() {
        let token = generate_reset_token();

        // 16 bytes -> 22 unpadded base64 chars, twice
        assert_eq!(token.len(), 44);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_token_not_expired_before_threshold() {
        let created_at = Utc::now() - TimeDelta::minutes(29);
        assert!(!is_token_expired(created_at));
    }

    #[test]
    fn test_token_expired_after_threshold() {
        let created_at = Utc::now() - TimeDelta::minutes(31);
        assert!(is_token_expired(created_at));
    }

    #[test]
    fn test_token_exactly_at_threshold_is_not_expired() {
        let now = Utc::now();
        let created_at = now - TimeDelta::minutes(30);

        assert!(!is_token_expired_at(created_at, now, 30));
        assert!(is_token_expired_at(
            created_at - TimeDelta::milliseconds(1),
            now,
            30
        ));
    }

    #[test]
    fn test_custom_expiry_threshold() {
        let created_at = Utc::now() - TimeDelta::minutes(10);

        assert!(is_token_expired_after(created_at, 5));
        assert!(!is_token_expired_after(created_at, 15));
    }

    #[test]
    fn test_out_of_range_thresholds_do_not_panic() {
        let created_at = Utc::now() - TimeDelta::minutes(31);

        assert!(!is_token_expired_after(created_at, i64::MAX));
        assert!(is_token_expired_after(created_at, i64::MIN));
        assert!(!is_token_expired_at(created_at, Utc::now(), i64::MAX / 60 + 1));
    }

    #[test]
    fn test_future_timestamp_is_not_expired() {
        let created_at = Utc::now() + TimeDelta::minutes(5);
        assert!(!is_token_expired(created_at));
    }
}
