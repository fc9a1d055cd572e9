/// Account endpoints
///
/// # Endpoints
///
/// - `POST /users` - Sign up, returns the user and a session token
/// - `POST /users/login` - Log in, returns the user and a new session token
/// - `POST /users/logout` - End the current session
/// - `POST /users/logoutAll` - End every session of the account
/// - `GET /users/me` - Read the profile
/// - `PATCH /users/me` - Update `name`, `email`, `password` and/or `age`
/// - `DELETE /users/me` - Delete the account with all of its tasks

use super::payload::{json_body, not_blank, parse_update};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use taskit_shared::{
    auth::{jwt, middleware::AuthContext, password},
    models::{
        user::{normalize_email, CreateUser, UpdateUser, User},
        user_token::UserToken,
    },
};
use uuid::Uuid;
use validator::Validate;

/// Fields a profile PATCH may touch
pub const UPDATABLE_FIELDS: &[&str] = &["name", "email", "password", "age"];

/// Signup request
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(custom(function = "not_blank"))]
    pub name: String,

    #[validate(email(message = "Email is invalid"))]
    pub email: String,

    /// Checked against the password rules separately
    pub password: String,

    #[serde(default)]
    #[validate(range(min = 0, message = "Age must be a positive number"))]
    pub age: i32,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Profile update request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(custom(function = "not_blank"))]
    pub name: Option<String>,

    #[validate(email(message = "Email is invalid"))]
    pub email: Option<String>,

    pub password: Option<String>,

    #[validate(range(min = 0, message = "Age must be a positive number"))]
    pub age: Option<i32>,
}

/// Signup and login response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

fn check_password(candidate: &str) -> ApiResult<()> {
    password::validate_password_rules(candidate)
        .map_err(|message| ApiError::ValidationError(vec![ValidationErrorDetail::new("password", message)]))
}

fn login_failed() -> ApiError {
    ApiError::BadRequest("Unable to login".to_string())
}

/// Signs a session token for `user_id` and adds it to the user's token list
async fn issue_session(state: &AppState, user_id: Uuid) -> ApiResult<String> {
    let claims = jwt::Claims::new(user_id, state.config.token_lifetime());
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    UserToken::create(&state.db, user_id, &token).await?;

    Ok(token)
}

/// Sign up
///
/// # Errors
///
/// - `400 Bad Request`: Invalid fields, weak password or email already in use
pub async fn signup(
    State(state): State<AppState>,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let mut req = json_body(body)?;
    req.email = normalize_email(&req.email);
    req.validate()?;
    check_password(&req.password)?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name.trim().to_string(),
            email: req.email,
            password_hash,
            age: req.age,
        },
    )
    .await
    .map_err(ApiError::from_write)?;

    let token = issue_session(&state, user.id).await?;

    state.mailer.send_welcome_email(&user.email, &user.name);

    tracing::info!(user_id = %user.id, "User signed up");

    Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}

/// Log in with email and password
///
/// Unknown emails and wrong passwords fail the same way.
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let req = json_body(body)?;

    let user = User::find_by_email(&state.db, &normalize_email(&req.email))
        .await?
        .ok_or_else(login_failed)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login with wrong password");
        return Err(login_failed());
    }

    let token = issue_session(&state, user.id).await?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse { user, token }))
}

/// End the session the request was made with
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    UserToken::delete(&state.db, auth.user.id, &auth.token).await?;

    tracing::info!(user_id = %auth.user.id, "User logged out");

    Ok(StatusCode::OK)
}

/// End every session of the account
pub async fn logout_all(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    let ended = UserToken::delete_all_for_user(&state.db, auth.user.id).await?;

    tracing::info!(user_id = %auth.user.id, sessions = ended, "User logged out everywhere");

    Ok(StatusCode::OK)
}

/// Read the caller's profile
pub async fn get_profile(Extension(auth): Extension<AuthContext>) -> Json<User> {
    Json(auth.user)
}

/// Update the caller's profile
///
/// # Errors
///
/// - `400 Bad Request`: Field outside the updatable set, invalid value,
///   weak password or email already in use
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<User>> {
    let mut req: UpdateProfileRequest = parse_update(body, UPDATABLE_FIELDS)?;
    req.email = req.email.as_deref().map(normalize_email);
    req.validate()?;

    let password_hash = match req.password.as_deref() {
        Some(candidate) => {
            check_password(candidate)?;
            Some(password::hash_password(candidate)?)
        }
        None => None,
    };

    let update = UpdateUser {
        name: req.name.map(|name| name.trim().to_string()),
        email: req.email,
        password_hash,
        age: req.age,
    };

    let user = User::update(&state.db, auth.user.id, update)
        .await
        .map_err(ApiError::from_write)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user.id, "Profile updated");

    Ok(Json(user))
}

/// Delete the caller's account, its tasks and sessions
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<User>> {
    let user = User::delete(&state.db, auth.user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    state.mailer.send_cancellation_email(&user.email, &user.name);

    tracing::info!(user_id = %user.id, "Account deleted");

    Ok(Json(user))
}
