use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

use super::handlers::{apply, list_admin, list_mine, review};
use crate::jwt::JwtKeys;
use crate::middleware::auth::{require_admin, require_auth};
use crate::state::AppState;

pub fn routes(jwt: JwtKeys) -> Router<AppState> {
    Router::new()
        .route("/events/:event_id/participate", post(apply))
        .route("/me/requests", get(list_mine))
        .route_layer(middleware::from_fn_with_state(jwt, require_auth))
}

pub fn admin_routes(jwt: JwtKeys) -> Router<AppState> {
    Router::new()
        .route("/", get(list_admin))
        .route("/:id", patch(review))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(jwt, require_auth))
}
