/// Password hashing using Argon2id
///
/// Plaintext passwords are hashed before they ever reach the database and
/// are never returned to callers. Parameters are fixed at build time.
///
/// # Security
///
/// - **Algorithm**: Argon2id (hybrid of Argon2i and Argon2d)
/// - **Memory**: 64 MB (65536 KB)
/// - **Iterations**: 3 passes
/// - **Parallelism**: 4 lanes
/// - **Output**: 32-byte hash
///
/// # Example
///
/// ```
/// use taskmate_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("correct-horse")?;
/// assert!(verify_password("correct-horse", &hash)?);
/// assert!(!verify_password("wrong-horse", &hash)?);
/// # Ok(())
/// # }
/// ```
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Hashes a password using Argon2id with fixed parameters
///
/// # Returns
///
/// PHC string format hash (includes algorithm, parameters, salt, and hash),
/// e.g. `$argon2id$v=19$m=65536,t=3,p=4$...$...`
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(65536)
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a stored hash
///
/// Comparison is constant-time.
///
/// # Returns
///
/// `Ok(true)` if the password matches, `Ok(false)` if it doesn't
///
/// # Errors
///
/// Returns `PasswordError` if the stored hash cannot be parsed
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    // Parameters are embedded in the hash string
    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!(
            "Verification failed: {}",
            e
        ))),
    }
}

/// Validates a candidate password against the account password policy
///
/// Rules:
/// - At least 7 characters long
/// - Must not contain the substring "password" (case-insensitive)
///
/// # Returns
///
/// `Ok(())` if acceptable, `Err` with the failing rule's message if not
///
/// # Example
///
/// ```
/// use taskmate_shared::auth::password::validate_password;
///
/// assert!(validate_password("secret12").is_ok());
/// assert!(validate_password("short").is_err());
/// assert!(validate_password("myPassword1").is_err());
/// ```
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < 7 {
        return Err("Password must be at least 7 characters long".to_string());
    }

    if password.to_lowercase().contains("password") {
        return Err("Password must not contain the word 'password'".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let hash = hash_password("test_secret_123").expect("Hash should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=65536"));
        assert!(hash.contains("t=3"));
        assert!(hash.contains("p=4"));
    }

    #[test]
    fn test_hash_password_produces_different_salts() {
        let hash1 = hash_password("same_secret").expect("Hash 1 should succeed");
        let hash2 = hash_password("same_secret").expect("Hash 2 should succeed");

        // Different salts = different hashes
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_hash_never_equals_plaintext() {
        let plaintext = "plain_but_long_enough";
        let hash = hash_password(plaintext).expect("Hash should succeed");
        assert_ne!(hash, plaintext);
    }

    #[test]
    fn test_verify_password_correct() {
        let hash = hash_password("correct_secret").expect("Hash should succeed");

        let result = verify_password("correct_secret", &hash).expect("Verify should succeed");
        assert!(result);
    }

    #[test]
    fn test_verify_password_incorrect() {
        let hash = hash_password("correct_secret").expect("Hash should succeed");

        let result = verify_password("wrong_secret", &hash).expect("Verify should succeed");
        assert!(!result);
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        let result = verify_password("anything", "not-a-phc-string");
        assert!(result.is_err());
    }

    #[test]
    fn test_hash_verify_roundtrip() {
        let passwords = vec![
            "simple1",
            "with spaces here",
            "with-special-chars!@#$%",
            "unicode-密码-パスワード",
        ];

        for password in passwords {
            let hash = hash_password(password).expect("Hash should succeed");
            let verified = verify_password(password, &hash).expect("Verify should succeed");
            assert!(verified, "Password '{}' should verify", password);
        }
    }

    #[test]
    fn test_validate_password_min_length() {
        assert!(validate_password("abcdefg").is_ok());

        let result = validate_password("abcdef");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("at least 7 characters"));
    }

    #[test]
    fn test_validate_password_forbidden_substring() {
        for candidate in ["password1", "myPassWord", "xxPASSWORDxx"] {
            let result = validate_password(candidate);
            assert!(result.is_err(), "'{}' should be rejected", candidate);
            assert!(result.unwrap_err().contains("password"));
        }
    }

    #[test]
    fn test_validate_password_accepts_ordinary_secrets() {
        for candidate in ["secret12", "hunter77", "tr0ub4dor&3"] {
            assert!(validate_password(candidate).is_ok(), "'{}'", candidate);
        }
    }
}
