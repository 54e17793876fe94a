// src/services/auth_service.rs
// DOCUMENTATION: Email/password login and signup

use crate::db::UserRepository;
use crate::errors::BoardError;
use crate::models::{avatar_url, name_from_email, LoginRequest, NewUser, SignupRequest, User, SIGNUP_AVATAR_STYLE};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use sqlx::PgPool;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Hash a password into a PHC string
pub fn hash_password(password: &str) -> Result<String, BoardError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            log::error!("Failed to hash password: {}", e);
            BoardError::InternalError
        })
}

/// Check a password against a stored PHC string; malformed hashes never match
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::warn!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

fn required_email(email: Option<&str>) -> Result<&str, BoardError> {
    match email.map(str::trim) {
        Some(e) if !e.is_empty() => Ok(e),
        _ => Err(BoardError::InvalidInput("Email is required".to_string())),
    }
}

pub struct AuthService;

impl AuthService {
    /// Authenticate by email and password
    /// Accounts without a stored hash (imported ones) pass only when
    /// `allow_legacy_login` is set
    pub async fn login(
        pool: &PgPool,
        req: &LoginRequest,
        allow_legacy_login: bool,
    ) -> Result<User, BoardError> {
        let email = required_email(req.email.as_deref())?;

        let user = UserRepository::find_by_email(pool, email)
            .await?
            .ok_or_else(|| {
                log::warn!("Login attempt for unknown email {}", email);
                BoardError::Unauthorized(INVALID_CREDENTIALS.to_string())
            })?;

        let accepted = match user.password_hash.as_deref() {
            Some(hash) => req
                .password
                .as_deref()
                .map(|pw| verify_password(pw, hash))
                .unwrap_or(false),
            None => allow_legacy_login,
        };

        if !accepted {
            log::warn!("Rejected login for {}", email);
            return Err(BoardError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        log::info!("User {} logged in", user.id);
        Ok(user)
    }

    /// Register a new account
    pub async fn signup(pool: &PgPool, req: &SignupRequest) -> Result<User, BoardError> {
        let email = required_email(req.email.as_deref())?;

        if UserRepository::find_by_email(pool, email).await?.is_some() {
            return Err(BoardError::AlreadyExists("User already exists".to_string()));
        }

        let name = match req.name.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => name_from_email(email),
        };

        let password_hash = match req.password.as_deref() {
            Some(pw) if !pw.is_empty() => Some(hash_password(pw)?),
            _ => None,
        };

        let new_user = NewUser {
            profile_pic_url: Some(avatar_url(&name, SIGNUP_AVATAR_STYLE)),
            name: Some(name),
            email: email.to_string(),
            password_hash,
            ..Default::default()
        };

        UserRepository::create(pool, &new_user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_required_email() {
        assert_eq!(required_email(Some(" a@b.c ")).unwrap(), "a@b.c");
        assert!(matches!(required_email(Some("  ")), Err(BoardError::InvalidInput(_))));
        assert!(matches!(required_email(None), Err(BoardError::InvalidInput(_))));
    }
}
