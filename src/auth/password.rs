use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tokio::task;

use crate::config::SecurityConfig;

/// Hash a password using Argon2id with a fresh random salt.
/// If config is None, uses the library defaults.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Verify a candidate password against a stored PHC-format hash.
/// Cost parameters are read back from the hash string itself.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Hash on the blocking pool. Argon2 is CPU-intensive and would stall the
/// async runtime if run directly on a worker thread.
pub async fn hash_async(password: String, config: &SecurityConfig) -> Result<String> {
    let config = config.clone();
    task::spawn_blocking(move || hash_password(&password, Some(&config)))
        .await
        .context("Password hashing task panicked")?
}

/// Verify on the blocking pool, same reasoning as [`hash_async`].
pub async fn verify_async(password: String, stored_hash: String) -> Result<bool> {
    task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .context("Password verification task panicked")?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
            ..SecurityConfig::default()
        }
    }

    #[test]
    fn test_hash_then_verify_round_trip() {
        let hash = hash_password("pa55word!", Some(&fast_config())).unwrap();

        assert!(verify_password("pa55word!", &hash).unwrap());
        assert!(!verify_password("pa55word", &hash).unwrap());
    }

    #[test]
    fn test_same_password_hashes_differently() {
        let cfg = fast_config();
        let a = hash_password("correct horse", Some(&cfg)).unwrap();
        let b = hash_password("correct horse", Some(&cfg)).unwrap();

        // Fresh salt per call
        assert_ne!(a, b);
        assert!(verify_password("correct horse", &a).unwrap());
        assert!(verify_password("correct horse", &b).unwrap());
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }
}
