//! Caller identity middleware
//!
//! Authentication happens upstream; the gateway forwards the verified caller
//! in `X-User-Id` and their role in `X-User-Role`. These middlewares turn the
//! headers into an [`AuthenticatedUser`] request extension and guard
//! attendant-only routes.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use super::common::ApiResponse;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserRole {
    Customer,
    Attendant,
    Admin,
}

impl UserRole {
    fn from_header(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "ATTENDANT" => Self::Attendant,
            "ADMIN" => Self::Admin,
            _ => Self::Customer,
        }
    }
}

/// Caller of the current request
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub role: UserRole,
}

impl AuthenticatedUser {
    /// Attendants and admins may act on other users' bookings
    pub fn is_staff(&self) -> bool {
        matches!(self.role, UserRole::Attendant | UserRole::Admin)
    }

    pub fn can_access(&self, owner_id: &str) -> bool {
        self.is_staff() || self.user_id == owner_id
    }
}

#[derive(Debug, Clone, Copy)]
enum AuthError {
    MissingUser,
    InsufficientPermissions,
}

fn read_user(request: &Request<Body>) -> Option<AuthenticatedUser> {
    let user_id = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())?;
    let role = request
        .headers()
        .get(USER_ROLE_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(UserRole::from_header)
        .unwrap_or(UserRole::Customer);
    Some(AuthenticatedUser {
        user_id: user_id.to_string(),
        role,
    })
}

/// Require a caller identity on every request
pub async fn auth_middleware(mut request: Request<Body>, next: Next) -> Response {
    let Some(user) = read_user(&request) else {
        return auth_error_response(AuthError::MissingUser);
    };
    request.extensions_mut().insert(user);
    next.run(request).await
}

/// Require an ATTENDANT or ADMIN caller
pub async fn staff_middleware(mut request: Request<Body>, next: Next) -> Response {
    let Some(user) = read_user(&request) else {
        return auth_error_response(AuthError::MissingUser);
    };
    if !user.is_staff() {
        return auth_error_response(AuthError::InsufficientPermissions);
    }
    request.extensions_mut().insert(user);
    next.run(request).await
}

fn auth_error_response(error: AuthError) -> Response {
    let (status, message) = match error {
        AuthError::MissingUser => (StatusCode::UNAUTHORIZED, "Missing caller identity"),
        AuthError::InsufficientPermissions => {
            (StatusCode::FORBIDDEN, "Attendant or admin role required")
        }
    };
    (status, Json(ApiResponse::<()>::error(message))).into_response()
}
