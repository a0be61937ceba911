use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use storage::models::Role;
use uuid::Uuid;

use crate::error::WebError;
use crate::jwt::JwtKeys;

/// Verified caller identity attached to the request by [`require_auth`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn require_role(&self, role: Role) -> Result<(), WebError> {
        if self.role == role {
            Ok(())
        } else {
            Err(WebError::Forbidden(format!("{:?} role required", role)))
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub async fn require_auth(
    State(keys): State<JwtKeys>,
    mut req: Request,
    next: Next,
) -> Result<Response, WebError> {
    let token = bearer_token(req.headers()).ok_or(WebError::Unauthorized)?;

    let claims = keys.verify(token).map_err(|e| {
        tracing::warn!("Rejected bearer token: {}", e);
        WebError::Unauthorized
    })?;

    req.extensions_mut().insert(AuthUser {
        user_id: claims.sub,
        role: claims.role,
    });

    Ok(next.run(req).await)
}

/// Must be layered inside [`require_auth`]
pub async fn require_admin(req: Request, next: Next) -> Result<Response, WebError> {
    let user = req
        .extensions()
        .get::<AuthUser>()
        .copied()
        .ok_or(WebError::Unauthorized)?;

    user.require_role(Role::Admin).inspect_err(|_| {
        tracing::warn!(user_id = %user.user_id, "Non-admin caller on admin route");
    })?;

    Ok(next.run(req).await)
}
