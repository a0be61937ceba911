use axum::{
    Router, middleware,
    routing::{get, post},
};

use super::handlers::{cancel_session, complete_session, get_payment_status, start_checkout};
use crate::jwt::JwtKeys;
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(jwt: JwtKeys) -> Router<AppState> {
    Router::new()
        .route("/participation/requests/:id/checkout", post(start_checkout))
        .route("/participation/requests/:id/payment", get(get_payment_status))
        .route("/sessions/complete", post(complete_session))
        .route("/sessions/cancel", post(cancel_session))
        .route_layer(middleware::from_fn_with_state(jwt, require_auth))
}
