use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::dto::event::{CreateEventRequest, PublicEventFilter, TargetSectorResponse};
use crate::error::{Result, StorageError};
use crate::models::Event;

const EVENT_COLUMNS: &str = r#"
    id, title, description, city, event_date_time, max_participants, price,
    target_director_percentage, created_at, updated_at
"#;

/// Repository for Event database operations
pub struct EventRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> EventRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Event> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound("Event"))?;

        Ok(event)
    }

    pub async fn find_target_sectors(&self, event_id: Uuid) -> Result<Vec<TargetSectorResponse>> {
        let rows = sqlx::query_as::<_, (Uuid, String, i32)>(
            r#"
            SELECT ets.sector_id, s.name, ets.percentage
            FROM event_target_sectors ets
            INNER JOIN sectors s ON s.id = ets.sector_id
            WHERE ets.event_id = $1
            ORDER BY ets.percentage DESC, s.name ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(sector_id, sector_name, percentage)| TargetSectorResponse {
                sector_id,
                sector_name,
                percentage,
            })
            .collect())
    }

    /// Insert the event and its target sectors atomically
    pub async fn create(&self, req: &CreateEventRequest) -> Result<Event> {
        let mut tx = self.pool.begin().await?;

        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (
                id, title, description, city, event_date_time, max_participants,
                price, target_director_percentage
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&req.title)
        .bind(&req.description)
        .bind(&req.city)
        .bind(req.event_date_time)
        .bind(req.max_participants)
        .bind(req.price)
        .bind(req.target_director_percentage)
        .fetch_one(&mut *tx)
        .await?;

        for target in &req.target_sectors {
            sqlx::query(
                r#"
                INSERT INTO event_target_sectors (event_id, sector_id, percentage)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(event.id)
            .bind(target.sector_id)
            .bind(target.percentage)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                let err = StorageError::from(e);
                if err.is_foreign_key_violation() {
                    return StorageError::NotFound("Sector");
                }
                err
            })?;
        }

        tx.commit().await?;
        Ok(event)
    }

    /// Upcoming events for the public catalog, soonest first
    pub async fn list_public(&self, filter: &PublicEventFilter) -> Result<(Vec<Event>, i64)> {
        let pagination = filter.pagination();

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM events WHERE 1=1");
        push_public_filters(&mut count, filter);
        let total_items = count
            .build_query_scalar::<i64>()
            .fetch_one(self.pool)
            .await?;

        let mut query = QueryBuilder::new(format!("SELECT {EVENT_COLUMNS} FROM events WHERE 1=1"));
        push_public_filters(&mut query, filter);
        query.push(" ORDER BY event_date_time ASC LIMIT ");
        query.push_bind(pagination.limit());
        query.push(" OFFSET ");
        query.push_bind(pagination.offset());

        let events = query.build_query_as::<Event>().fetch_all(self.pool).await?;

        Ok((events, total_items))
    }

    /// Take the row lock that serializes seat allocation for one event.
    ///
    /// Every settlement for the event queues here until the holder commits,
    /// so the seat count read afterwards cannot go stale before the write.
    pub async fn lock_for_settlement(
        tx: &mut Transaction<'_, Postgres>,
        event_id: Uuid,
    ) -> Result<()> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM events
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(event_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(StorageError::NotFound("Event"))?;

        Ok(())
    }
}

fn push_public_filters<'q>(query: &mut QueryBuilder<'q, Postgres>, filter: &'q PublicEventFilter) {
    if let Some(ref city) = filter.city {
        query.push(" AND LOWER(city) = LOWER(");
        query.push_bind(city);
        query.push(")");
    }

    query.push(" AND event_date_time >= ");
    query.push_bind(filter.from.unwrap_or_else(Utc::now));

    if let Some(to) = filter.to {
        query.push(" AND event_date_time <= ");
        query.push_bind(to);
    }
}
