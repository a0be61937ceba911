use axum::Router;

use crate::jwt::JwtKeys;
use crate::state::AppState;

pub mod events;
pub mod participation;
pub mod payments;
pub mod sectors;

pub fn router(jwt: JwtKeys) -> Router<AppState> {
    Router::new()
        .nest("/participation", participation::routes::routes(jwt.clone()))
        .nest(
            "/admin/participation-requests",
            participation::routes::admin_routes(jwt.clone()),
        )
        .nest("/payments", payments::routes::routes(jwt.clone()))
        .nest("/events", events::routes::routes())
        .nest("/admin/events", events::routes::admin_routes(jwt.clone()))
        .nest("/sectors", sectors::routes::routes())
        .nest("/admin/sectors", sectors::routes::admin_routes(jwt))
}
