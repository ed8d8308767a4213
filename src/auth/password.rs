use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use regex::Regex;
use tracing::error;

const SPECIALS: &str = "@$!%*?&";

/// Password policy: at least 8 characters drawn from letters, digits and
/// `@$!%*?&`, with at least one uppercase letter, one digit and one special.
pub fn meets_policy(plain: &str) -> bool {
    lazy_static! {
        static ref ALLOWED_RE: Regex = Regex::new(r"^[A-Za-z\d@$!%*?&]{8,}$").unwrap();
    }
    ALLOWED_RE.is_match(plain)
        && plain.chars().any(|c| c.is_ascii_uppercase())
        && plain.chars().any(|c| c.is_ascii_digit())
        && plain.chars().any(|c| SPECIALS.contains(c))
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_accepts_valid_passwords() {
        for p in ["Passw0rd!", "Abcdef1@", "XyZ12345&", "A1@aaaaa"] {
            assert!(meets_policy(p), "{p} should pass");
        }
    }

    #[test]
    fn policy_rejects_violations() {
        let cases = [
            ("Ab1@xyz", "too short"),
            ("passw0rd!", "no uppercase"),
            ("Password!", "no digit"),
            ("Passw0rdd", "no special"),
            ("Passw0rd! ", "space outside allowed set"),
            ("Passw0rd#", "special outside allowed set"),
            ("", "empty"),
        ];
        for (p, why) in cases {
            assert!(!meets_policy(p), "{p:?} should fail: {why}");
        }
    }

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hash = hash_password("Correct1!").expect("hashing should succeed");
        assert!(!verify_password("Wrong1!aa", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }
}
