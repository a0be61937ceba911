use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::dto::event::EventResponse;
use crate::dto::participation::{AdminRequestFilter, ParticipationRequestDetail, UserSummary};
use crate::dto::payment::PaymentResponse;
use crate::error::{Result, StorageError};
use crate::models::{ParticipationRequest, ParticipationStatus, PaymentStatus};

const DETAIL_SELECT: &str = r#"
    SELECT
        pr.id, pr.user_id, pr.event_id, pr.status, pr.created_at, pr.updated_at,
        e.title AS event_title,
        e.description AS event_description,
        e.city AS event_city,
        e.event_date_time AS event_date_time,
        e.max_participants AS event_max_participants,
        e.price AS event_price,
        e.target_director_percentage AS event_target_director_percentage,
        e.created_at AS event_created_at,
        e.updated_at AS event_updated_at,
        u.email AS user_email,
        u.first_name AS user_first_name,
        u.last_name AS user_last_name,
        u.company_name AS user_company_name,
        u.job_title AS user_job_title,
        p.id AS payment_id,
        p.amount AS payment_amount,
        p.reference AS payment_reference,
        p.status AS payment_status,
        p.created_at AS payment_created_at,
        p.updated_at AS payment_updated_at
    FROM participation_requests pr
    INNER JOIN events e ON e.id = pr.event_id
    INNER JOIN users u ON u.id = pr.user_id
    LEFT JOIN payments p ON p.participation_request_id = pr.id
"#;

#[derive(FromRow)]
struct DetailRow {
    id: Uuid,
    user_id: Uuid,
    event_id: Uuid,
    status: ParticipationStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    event_title: String,
    event_description: Option<String>,
    event_city: String,
    event_date_time: DateTime<Utc>,
    event_max_participants: i32,
    event_price: Decimal,
    event_target_director_percentage: Option<i32>,
    event_created_at: DateTime<Utc>,
    event_updated_at: DateTime<Utc>,
    user_email: String,
    user_first_name: String,
    user_last_name: String,
    user_company_name: Option<String>,
    user_job_title: Option<String>,
    payment_id: Option<Uuid>,
    payment_amount: Option<Decimal>,
    payment_reference: Option<String>,
    payment_status: Option<PaymentStatus>,
    payment_created_at: Option<DateTime<Utc>>,
    payment_updated_at: Option<DateTime<Utc>>,
}

impl From<DetailRow> for ParticipationRequestDetail {
    fn from(row: DetailRow) -> Self {
        let payment = match (
            row.payment_id,
            row.payment_amount,
            row.payment_reference,
            row.payment_status,
            row.payment_created_at,
            row.payment_updated_at,
        ) {
            (Some(id), Some(amount), Some(reference), Some(status), Some(created_at), Some(updated_at)) => {
                Some(PaymentResponse {
                    id,
                    amount,
                    reference,
                    status,
                    created_at,
                    updated_at,
                })
            }
            _ => None,
        };

        Self {
            id: row.id,
            user_id: row.user_id,
            event_id: row.event_id,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
            event: EventResponse {
                id: row.event_id,
                title: row.event_title,
                description: row.event_description,
                city: row.event_city,
                event_date_time: row.event_date_time,
                max_participants: row.event_max_participants,
                price: row.event_price,
                target_director_percentage: row.event_target_director_percentage,
                created_at: row.event_created_at,
                updated_at: row.event_updated_at,
            },
            payment,
            user: Some(UserSummary {
                id: row.user_id,
                email: row.user_email,
                first_name: row.user_first_name,
                last_name: row.user_last_name,
                company_name: row.user_company_name,
                job_title: row.user_job_title,
            }),
        }
    }
}

/// Repository for ParticipationRequest database operations
pub struct ParticipationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ParticipationRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<ParticipationRequest> {
        let request = sqlx::query_as::<_, ParticipationRequest>(
            r#"
            SELECT id, user_id, event_id, status, created_at, updated_at
            FROM participation_requests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound("Participation request"))?;

        Ok(request)
    }

    /// Most recent request of a user for an event, whatever its status
    pub async fn find_latest(
        &self,
        user_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<ParticipationRequest>> {
        let request = sqlx::query_as::<_, ParticipationRequest>(
            r#"
            SELECT id, user_id, event_id, status, created_at, updated_at
            FROM participation_requests
            WHERE user_id = $1 AND event_id = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(request)
    }

    /// Insert a new PENDING request.
    ///
    /// The partial unique index on active requests turns a lost race between
    /// two applications into a Conflict.
    pub async fn create(&self, user_id: Uuid, event_id: Uuid) -> Result<ParticipationRequest> {
        sqlx::query_as::<_, ParticipationRequest>(
            r#"
            INSERT INTO participation_requests (id, user_id, event_id, status)
            VALUES ($1, $2, $3, 'PENDING')
            RETURNING id, user_id, event_id, status, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(event_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            let err = StorageError::from(e);
            if err.is_unique_violation() {
                return StorageError::Conflict(
                    "You already have an active request for this event.".to_string(),
                );
            }
            if err.is_foreign_key_violation() {
                return StorageError::NotFound("User");
            }
            err
        })
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        status: ParticipationStatus,
    ) -> Result<ParticipationRequest> {
        let request = sqlx::query_as::<_, ParticipationRequest>(
            r#"
            UPDATE participation_requests
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, event_id, status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            let err = StorageError::from(e);
            if err.is_unique_violation() {
                return StorageError::Conflict(format!(
                    "Cannot mark request {status}: the user has another active request for this event."
                ));
            }
            err
        })?
        .ok_or(StorageError::NotFound("Participation request"))?;

        Ok(request)
    }

    pub async fn find_detail(&self, id: Uuid) -> Result<ParticipationRequestDetail> {
        let mut query = QueryBuilder::<Postgres>::new(DETAIL_SELECT);
        query.push(" WHERE pr.id = ");
        query.push_bind(id);

        let row = query
            .build_query_as::<DetailRow>()
            .fetch_optional(self.pool)
            .await?
            .ok_or(StorageError::NotFound("Participation request"))?;

        Ok(row.into())
    }

    /// All requests of a user, newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ParticipationRequestDetail>> {
        let mut query = QueryBuilder::<Postgres>::new(DETAIL_SELECT);
        query.push(" WHERE pr.user_id = ");
        query.push_bind(user_id);
        query.push(" ORDER BY pr.created_at DESC");

        let rows = query.build_query_as::<DetailRow>().fetch_all(self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|row| ParticipationRequestDetail::from(row).without_user())
            .collect())
    }

    pub async fn list_admin(
        &self,
        filter: &AdminRequestFilter,
    ) -> Result<(Vec<ParticipationRequestDetail>, i64)> {
        let pagination = filter.pagination();

        let mut count = QueryBuilder::<Postgres>::new(
            r#"
            SELECT COUNT(*)
            FROM participation_requests pr
            INNER JOIN events e ON e.id = pr.event_id
            INNER JOIN users u ON u.id = pr.user_id
            "#,
        );
        push_admin_filters(&mut count, filter);
        let total_items = count
            .build_query_scalar::<i64>()
            .fetch_one(self.pool)
            .await?;

        let mut query = QueryBuilder::<Postgres>::new(DETAIL_SELECT);
        push_admin_filters(&mut query, filter);
        query.push(" ORDER BY pr.created_at DESC LIMIT ");
        query.push_bind(pagination.limit());
        query.push(" OFFSET ");
        query.push_bind(pagination.offset());

        let rows = query.build_query_as::<DetailRow>().fetch_all(self.pool).await?;

        Ok((rows.into_iter().map(Into::into).collect(), total_items))
    }

    /// Seats already consumed at an event, not counting `excluding`.
    ///
    /// Must run after [`super::event::EventRepository::lock_for_settlement`]
    /// in the same transaction to be race free.
    pub async fn count_seats_taken(
        tx: &mut Transaction<'_, Postgres>,
        event_id: Uuid,
        excluding: Uuid,
    ) -> Result<i64> {
        let mut query =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM participation_requests WHERE event_id = ");
        query.push_bind(event_id);
        query.push(" AND id <> ");
        query.push_bind(excluding);
        query.push(" AND status IN (");
        let mut statuses = query.separated(", ");
        for status in ParticipationStatus::SEAT_HOLDING {
            statuses.push_bind(status);
        }
        query.push(")");

        let taken = query
            .build_query_scalar::<i64>()
            .fetch_one(&mut **tx)
            .await?;

        Ok(taken)
    }

    pub async fn set_status_in(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        status: ParticipationStatus,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE participation_requests
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound("Participation request"));
        }

        Ok(())
    }
}

fn push_admin_filters<'q>(query: &mut QueryBuilder<'q, Postgres>, filter: &'q AdminRequestFilter) {
    query.push(" WHERE 1=1");

    if let Some(status) = filter.status {
        query.push(" AND pr.status = ");
        query.push_bind(status);
    }

    if let Some(q) = filter.search_term() {
        let pattern = format!("%{}%", q);
        query.push(" AND (u.email ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR e.title ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR e.city ILIKE ");
        query.push_bind(pattern);
        query.push(")");
    }
}
