//! Account route handlers: registration, login, logout, profile, addresses.

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use bazaar_core::{Address, Email};

use super::extract::{ApiJson, ApiPath};
use super::multipart::read_form;
use crate::db::UserRepository;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, RequireAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, PublicUser, User, UserProfile};
use crate::response::ApiResponse;
use crate::services::{AccountService, AuthError, AuthService, MediaFolder};
use crate::state::AppState;

/// Multipart field carrying the optional profile picture.
const PROFILE_IMAGE_FIELD: &str = "profileImage";

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Add-address request body.
#[derive(Debug, Deserialize)]
pub struct AddressRequest {
    /// Legacy field; must name the logged-in user when present.
    pub email: Option<String>,
    pub address: Address,
}

/// Register a new account from a multipart form.
///
/// Fields: `name`, `email`, `password`, optional `profileImage` file. The
/// image is only uploaded once the fields are valid and the email is free.
#[instrument(skip(state, session, multipart))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse> {
    let mut form = read_form(multipart?, PROFILE_IMAGE_FIELD).await?;
    let name = form.take("name").unwrap_or_default();
    let email = form.take("email").unwrap_or_default();
    let password = form.take("password").unwrap_or_default();

    let registration = AuthService::validate_registration(&name, &email, &password)?;
    if UserRepository::new(state.pool())
        .get_by_email(&registration.email)
        .await?
        .is_some()
    {
        return Err(AuthError::UserAlreadyExists.into());
    }

    let profile_image = state
        .media()
        .ingest(form.file, MediaFolder::Profiles)
        .await?;

    let user = AuthService::new(state.pool())
        .register(&name, &email, &password, profile_image.as_deref())
        .await?;

    establish_session(&session, &user).await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok_with_message(PublicUser::from(&user), "Registration successful"),
    ))
}

/// Log in with email and password.
#[instrument(skip(state, session, req))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<ApiResponse<PublicUser>> {
    let user = AuthService::new(state.pool())
        .login(&req.email, &req.password)
        .await?;

    establish_session(&session, &user).await?;
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(ApiResponse::ok_with_message(
        PublicUser::from(&user),
        "Login successful",
    ))
}

/// Log out, discarding the session.
#[instrument(skip(session, auth))]
pub async fn logout(session: Session, OptionalAuth(auth): OptionalAuth) -> Result<ApiResponse<()>> {
    clear_current_user(&session).await?;
    clear_sentry_user();

    if let Some(user) = auth {
        tracing::info!(user_id = %user.id, "user logged out");
    }

    Ok(ApiResponse::message("Logged out"))
}

/// Profile of the logged-in user.
#[instrument(skip(state, auth, email))]
pub async fn profile(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiPath(email): ApiPath<String>,
) -> Result<ApiResponse<UserProfile>> {
    auth.ensure_email(Some(email.as_str()))?;

    let profile = AccountService::new(state.pool()).profile(&auth.0).await?;
    Ok(ApiResponse::ok(profile))
}

/// Append a shipping address and return the full list.
#[instrument(skip(state, auth, req))]
pub async fn add_address(
    State(state): State<AppState>,
    auth: RequireAuth,
    ApiJson(req): ApiJson<AddressRequest>,
) -> Result<ApiResponse<Vec<Address>>> {
    auth.ensure_email(req.email.as_deref())?;

    let addresses = AccountService::new(state.pool())
        .add_address(&auth.0, req.address)
        .await?;

    Ok(ApiResponse::ok_with_message(addresses, "Address added"))
}

async fn establish_session(session: &Session, user: &User) -> std::result::Result<(), AppError> {
    let current = CurrentUser {
        id: user.id,
        email: user.email.clone(),
    };
    set_current_user(session, &current).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

/// Parse an email from a path segment.
pub(super) fn path_email(raw: &str) -> std::result::Result<Email, AppError> {
    Email::parse(raw).map_err(|_| AppError::BadRequest("Invalid email address".to_string()))
}
