//! Authentication service.
//!
//! Password registration and login. Passwords are stored as Argon2id PHC
//! strings with a random salt; the plaintext never leaves this module.

mod error;

pub use error::AuthError;

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use bazaar_core::Email;

use crate::db::RepositoryError;
use crate::db::users::{NewUser, UserRepository};
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum display name length.
const MAX_NAME_LENGTH: usize = 100;

/// Verified against when the account does not exist, so unknown emails cost
/// the same Argon2 work as wrong passwords.
static DUMMY_HASH: LazyLock<String> =
    LazyLock::new(|| hash_password("bazaar-unknown-account").unwrap_or_default());

/// Validated registration fields.
#[derive(Debug)]
pub struct Registration {
    pub name: String,
    pub email: Email,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Check registration fields without touching the database.
    ///
    /// Handlers call this before ingesting a profile image so invalid forms
    /// never reach the image host.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingName` or `AuthError::NameTooLong` for a bad
    /// name, `AuthError::InvalidEmail`, or `AuthError::WeakPassword`.
    pub fn validate_registration(
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Registration, AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingName);
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(AuthError::NameTooLong {
                max: MAX_NAME_LENGTH,
            });
        }
        let email = Email::parse(email)?;
        validate_password(password)?;

        Ok(Registration {
            name: name.to_owned(),
            email,
        })
    }

    /// Register a new user with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[tracing::instrument(skip(self, password, profile_image))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        profile_image: Option<&str>,
    ) -> Result<User, AuthError> {
        let registration = Self::validate_registration(name, email, password)?;
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(&NewUser {
                name: &registration.name,
                email: &registration.email,
                password_hash: &password_hash,
                profile_image,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "account registered");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let Ok(email) = Email::parse(email) else {
            return Err(reject_unknown_account(password));
        };

        let Some((user, password_hash)) = self.users.get_password_hash(&email).await? else {
            return Err(reject_unknown_account(password));
        };

        verify_password(password, &password_hash)?;

        Ok(user)
    }
}

/// Burn one hash verification and fail the login.
fn reject_unknown_account(password: &str) -> AuthError {
    let _ = verify_password(password, &DUMMY_HASH);
    AuthError::InvalidCredentials
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_roundtrip_and_salt() {
        let first = hash_password("correct horse").unwrap();
        let second = hash_password("correct horse").unwrap();
        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$"));
        assert!(!first.contains("correct horse"));

        assert!(verify_password("correct horse", &first).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &first),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_unknown_account_runs_a_real_verification() {
        assert!(PasswordHash::new(&DUMMY_HASH).is_ok());
        assert!(DUMMY_HASH.starts_with("$argon2id$"));
        assert!(matches!(
            reject_unknown_account("longenough"),
            AuthError::InvalidCredentials
        ));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("whatever", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_registration() {
        let ok = AuthService::validate_registration(" Ada ", "ADA@Example.com", "longenough")
            .unwrap();
        assert_eq!(ok.name, "Ada");
        assert_eq!(ok.email.as_str(), "ada@example.com");

        assert!(matches!(
            AuthService::validate_registration("  ", "ada@example.com", "longenough"),
            Err(AuthError::MissingName)
        ));
        assert!(matches!(
            AuthService::validate_registration("Ada", "not-an-email", "longenough"),
            Err(AuthError::InvalidEmail(_))
        ));
        assert!(matches!(
            AuthService::validate_registration("Ada", "ada@example.com", "short"),
            Err(AuthError::WeakPassword(_))
        ));
    }
}
