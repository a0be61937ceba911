use std::sync::Arc;

use anyhow::Context;
use axum::{Router, http::HeaderValue};
use storage::Database;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod features;
mod jwt;
mod middleware;
mod notifier;
mod state;

use config::Config;
use features::{events, participation, payments, sectors};
use jwt::JwtKeys;
use notifier::LogNotifier;
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        participation::handlers::apply,
        participation::handlers::list_mine,
        participation::handlers::list_admin,
        participation::handlers::review,
        payments::handlers::start_checkout,
        payments::handlers::complete_session,
        payments::handlers::cancel_session,
        payments::handlers::get_payment_status,
        events::handlers::list_events,
        events::handlers::get_event,
        events::handlers::get_event_detail,
        events::handlers::create_event,
        sectors::handlers::list_sectors,
        sectors::handlers::create_sector,
    ),
    components(
        schemas(
            storage::dto::participation::ReviewDecision,
            storage::dto::participation::ReviewRequest,
            storage::dto::participation::UserSummary,
            storage::dto::participation::ParticipationRequestDetail,
            storage::dto::payment::PaymentResponse,
            storage::dto::payment::CheckoutSessionResponse,
            storage::dto::payment::CompletionResponse,
            storage::dto::payment::CancellationResponse,
            storage::dto::payment::PaymentState,
            storage::dto::payment::PaymentStatusResponse,
            storage::dto::event::CreateEventRequest,
            storage::dto::event::TargetSectorInput,
            storage::dto::event::EventResponse,
            storage::dto::event::EventDetailResponse,
            storage::dto::event::TargetSectorResponse,
            storage::dto::sector::CreateSectorRequest,
            storage::dto::sector::SectorResponse,
            storage::dto::common::PaginationMeta,
            storage::models::ParticipationStatus,
            storage::models::PaymentStatus,
            storage::models::Role,
        )
    ),
    tags(
        (name = "participation", description = "Apply to events and follow your requests"),
        (name = "payments", description = "Checkout and settlement of approved requests"),
        (name = "events", description = "Public event catalog"),
        (name = "sectors", description = "Audience sectors"),
        (name = "admin", description = "Administration endpoints"),
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

fn cors_layer(allowed_origins: &[String]) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.is_empty() {
        return Ok(layer.allow_origin(Any));
    }

    let origins = allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin: {origin}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(layer.allow_origin(origins))
}

fn app(state: AppState, jwt: JwtKeys, cors: CorsLayer) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", features::router(jwt))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting Summit participation API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    tracing::info!(
        "Connecting to database at: {}",
        config
            .database_url
            .split('@')
            .next_back()
            .unwrap_or("unknown")
    );
    let db = Database::new(&config.database_url, config.database_max_connections)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations");
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    let state = AppState {
        db,
        notifier: Arc::new(LogNotifier),
        checkout_base_url: Arc::from(config.checkout_base_url.as_str()),
    };
    let jwt = JwtKeys::new(&config.jwt_secret);
    let cors = cors_layer(&config.cors_allowed_origins)?;

    let bind_address = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    axum::serve(listener, app(state, jwt, cors)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_settlement_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/participation/events/{event_id}/participate",
            "/api/admin/participation-requests/{id}",
            "/api/payments/sessions/complete",
            "/api/payments/sessions/cancel",
            "/api/payments/participation/requests/{id}/checkout",
            "/api/payments/participation/requests/{id}/payment",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_cors_rejects_malformed_origin() {
        assert!(cors_layer(&["https://ok.example".to_string()]).is_ok());
        assert!(cors_layer(&["bad\norigin".to_string()]).is_err());
        assert!(cors_layer(&[]).is_ok());
    }
}
