//! Authentication extractors.
//!
//! The principal is the `CurrentUser` stored in the session at login or
//! registration. Request fields that still carry an email (path segments,
//! `email` in bodies, `userEmail` in queries and forms) are only
//! cross-checked against it.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};

/// Extractor that requires an authenticated user.
///
/// Rejects with 401 and the JSON error envelope when there is no session
/// user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl RequireAuth {
    /// Check that a client-supplied email names the principal.
    ///
    /// `None` (field omitted) is accepted.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` when the email belongs to someone else.
    pub fn ensure_email(&self, claimed: Option<&str>) -> Result<(), AppError> {
        match claimed {
            Some(raw) if !self.0.email.matches(raw) => {
                tracing::warn!(user_id = %self.0.id, "request email does not match session user");
                Err(AppError::Forbidden(
                    "Not allowed to act on behalf of another user".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AppError::Unauthorized("Please log in".to_string()))?;

        let user: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Please log in".to_string()))?;

        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is logged in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Store the user in the session, rotating the session ID first.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Clear the whole session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be deleted.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::{Email, UserId};

    use super::*;

    fn principal() -> RequireAuth {
        RequireAuth(CurrentUser {
            id: UserId::new(1),
            email: Email::parse("ada@example.com").unwrap(),
        })
    }

    #[test]
    fn test_ensure_email_accepts_own_or_missing() {
        let auth = principal();
        assert!(auth.ensure_email(None).is_ok());
        assert!(auth.ensure_email(Some("ada@example.com")).is_ok());
        assert!(auth.ensure_email(Some(" ADA@Example.com ")).is_ok());
    }

    #[test]
    fn test_ensure_email_rejects_others() {
        let auth = principal();
        assert!(matches!(
            auth.ensure_email(Some("eve@example.com")),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            auth.ensure_email(Some("garbage")),
            Err(AppError::Forbidden(_))
        ));
    }
}
