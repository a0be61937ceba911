//! Throwaway Postgres for integration tests.
//!
//! Each test gets its own container so tests never observe each other's
//! rows. Run with: cargo test -p summit-storage -- --ignored

#![allow(dead_code)]

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use storage::{
    Database,
    dto::event::{CreateEventRequest, TargetSectorInput},
    dto::participation::ReviewDecision,
    models::{Event, Role},
    repository::event::EventRepository,
    services::participation,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use uuid::Uuid;

pub const CHECKOUT_BASE_URL: &str = "http://localhost:3000";

pub struct TestDb {
    pub db: Database,
    _postgres: ContainerAsync<Postgres>,
}

impl TestDb {
    pub async fn start() -> Result<Self> {
        let postgres = Postgres::default()
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let host = postgres.get_host().await?;
        let port = postgres.get_host_port_ipv4(5432).await?;
        let url = format!("postgres://postgres:postgres@{host}:{port}/postgres");

        let db = Database::new(&url, 20)
            .await
            .context("Failed to connect to test database")?;
        db.run_migrations().await.context("Failed to run migrations")?;

        Ok(Self {
            db,
            _postgres: postgres,
        })
    }

    pub fn pool(&self) -> &sqlx::PgPool {
        self.db.pool()
    }

    pub async fn user(&self, email: &str) -> Result<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO users (id, email, first_name, last_name, company_name, job_title, role)
            VALUES ($1, $2, 'Test', 'User', 'Acme', 'CFO', $3)
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(Role::User)
        .execute(self.pool())
        .await?;
        Ok(id)
    }

    pub async fn event(&self, max_participants: i32, price_cents: i64) -> Result<Event> {
        let sector_id = Uuid::new_v4();
        sqlx::query("INSERT INTO sectors (id, name) VALUES ($1, $2)")
            .bind(sector_id)
            .bind(format!("Finance {sector_id}"))
            .execute(self.pool())
            .await?;

        let request = CreateEventRequest {
            title: "Leaders Dinner".to_string(),
            description: Some("Invitation only".to_string()),
            city: "Paris".to_string(),
            event_date_time: Utc::now() + Duration::days(30),
            max_participants,
            price: Decimal::new(price_cents, 2),
            target_director_percentage: Some(50),
            target_sectors: vec![TargetSectorInput {
                sector_id,
                percentage: 100,
            }],
        };

        Ok(EventRepository::new(self.pool()).create(&request).await?)
    }

    /// Apply and approve in one go
    pub async fn approved_request(&self, user_id: Uuid, event_id: Uuid) -> Result<Uuid> {
        let request = participation::apply(self.pool(), user_id, event_id).await?;
        participation::review(self.pool(), request.id, ReviewDecision::Approved).await?;
        Ok(request.id)
    }

    pub async fn count_with_status(&self, event_id: Uuid, status: &str) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM participation_requests WHERE event_id = $1 AND status::text = $2",
        )
        .bind(event_id)
        .bind(status)
        .fetch_one(self.pool())
        .await?;
        Ok(count)
    }
}
