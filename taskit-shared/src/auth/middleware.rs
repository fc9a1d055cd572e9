/// Bearer-token authentication
///
/// A request is authenticated when its `Authorization: Bearer <token>` header
/// carries a token that
///
/// 1. has a valid signature, issuer and expiry, and
/// 2. is still present in the token list of the user named by its `sub` claim.
///
/// On success an [`AuthContext`] holding the user and the presented token is
/// produced; the API server inserts it into the request extensions so
/// handlers can pull it out with `Extension<AuthContext>`.
///
/// # Example
///
/// ```no_run
/// use axum::Extension;
/// use taskit_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, {}!", auth.user.name)
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sqlx::PgPool;

use super::jwt::{validate_token, JwtError};
use crate::models::user::User;

/// Authentication context added to request extensions
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The authenticated user
    pub user: User,

    /// The session token the request was authenticated with
    pub token: String,
}

/// Error type for authentication
#[derive(Debug)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,

    /// Authorization header is not a bearer token
    InvalidFormat(String),

    /// Token validation failed
    InvalidToken(String),

    /// Token is well formed but not in any user's active token list
    UnknownSession,

    /// Database error
    DatabaseError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::DatabaseError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
            _ => (StatusCode::UNAUTHORIZED, "Please authenticate.").into_response(),
        }
    }
}

/// Extracts the token from an `Authorization` header value
pub fn parse_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingCredentials)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?
        .trim();

    if token.is_empty() {
        return Err(AuthError::InvalidFormat("Empty bearer token".to_string()));
    }

    Ok(token)
}

/// Authenticates a raw `Authorization` header value
///
/// # Errors
///
/// - `MissingCredentials` / `InvalidFormat` for absent or malformed headers
/// - `InvalidToken` for bad signatures, foreign issuers and expired tokens
/// - `UnknownSession` when no user holds the token (logged out, deleted)
/// - `DatabaseError` when the token lookup fails
pub async fn authenticate(
    pool: &PgPool,
    secret: &str,
    header: Option<&str>,
) -> Result<AuthContext, AuthError> {
    let token = parse_bearer(header)?;

    let claims = validate_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken(format!("Invalid token: {}", e)),
    })?;

    let user = User::find_by_token(pool, claims.sub, token)
        .await
        .map_err(|e| AuthError::DatabaseError(format!("Database error: {}", e)))?
        .ok_or(AuthError::UnknownSession)?;

    Ok(AuthContext {
        user,
        token: token.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bearer() {
        assert_eq!(parse_bearer(Some("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
        assert!(matches!(
            parse_bearer(None),
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            parse_bearer(Some("Basic dXNlcjpwYXNz")),
            Err(AuthError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_bearer(Some("Bearer   ")),
            Err(AuthError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_auth_error_into_response() {
        let response = AuthError::MissingCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::InvalidFormat("test".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::UnknownSession.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::DatabaseError("test".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
