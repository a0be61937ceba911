use axum::{
    Router, middleware,
    routing::{get, post},
};

use super::handlers::{create_sector, list_sectors};
use crate::jwt::JwtKeys;
use crate::middleware::auth::{require_admin, require_auth};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list_sectors))
}

pub fn admin_routes(jwt: JwtKeys) -> Router<AppState> {
    Router::new()
        .route("/", post(create_sector))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(jwt, require_auth))
}
