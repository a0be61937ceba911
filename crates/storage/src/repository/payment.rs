use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgExecutor, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{ParticipationStatus, Payment, PaymentStatus};

const PAYMENT_COLUMNS: &str =
    "id, participation_request_id, amount, reference, status, created_at, updated_at";

/// A payment together with what settlement needs to know about its
/// request, event and owner.
#[derive(Debug, Clone, FromRow)]
pub struct PaymentContext {
    pub payment_id: Uuid,
    pub request_id: Uuid,
    pub amount: Decimal,
    pub reference: String,
    pub payment_status: PaymentStatus,
    pub user_id: Uuid,
    pub user_email: String,
    pub request_status: ParticipationStatus,
    pub event_id: Uuid,
    pub event_title: String,
    pub event_city: String,
    pub event_date_time: DateTime<Utc>,
    pub max_participants: i32,
}

/// Repository for Payment database operations
pub struct PaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_request_id(&self, request_id: Uuid) -> Result<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE participation_request_id = $1"
        ))
        .bind(request_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(payment)
    }

    /// Open or reopen the checkout of a request.
    ///
    /// A first call stores `new_reference`; later calls keep the reference
    /// already on file, refresh the amount and put the payment back to PENDING.
    /// A SUCCEEDED payment is never reopened: the update is skipped and a
    /// Conflict returned, also when a completion commits while we wait on
    /// its row lock.
    pub async fn upsert_pending(
        &self,
        request_id: Uuid,
        amount: Decimal,
        new_reference: &str,
    ) -> Result<Payment> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            INSERT INTO payments (id, participation_request_id, amount, reference, status)
            VALUES ($1, $2, $3, $4, 'PENDING')
            ON CONFLICT (participation_request_id)
            DO UPDATE SET
                amount = EXCLUDED.amount,
                status = 'PENDING',
                updated_at = NOW()
            WHERE payments.status <> 'SUCCEEDED'
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(request_id)
        .bind(amount)
        .bind(new_reference)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| StorageError::Conflict("Payment already succeeded.".to_string()))?;

        Ok(payment)
    }

    pub async fn find_context(&self, reference: &str) -> Result<PaymentContext> {
        fetch_context(self.pool, reference, false)
            .await?
            .ok_or(StorageError::NotFound("Payment session"))
    }

    /// Like [`Self::find_context`] but inside `tx`, optionally locking the
    /// payment and request rows until commit.
    pub async fn find_context_in(
        tx: &mut Transaction<'_, Postgres>,
        reference: &str,
        lock: bool,
    ) -> Result<PaymentContext> {
        fetch_context(&mut **tx, reference, lock)
            .await?
            .ok_or(StorageError::NotFound("Payment session"))
    }

    pub async fn set_status_in(
        tx: &mut Transaction<'_, Postgres>,
        payment_id: Uuid,
        status: PaymentStatus,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(payment_id)
        .bind(status)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound("Payment session"));
        }

        Ok(())
    }

    /// Mark a payment FAILED unless it has already succeeded.
    ///
    /// Returns `false` when the payment succeeded first; the guard lives in
    /// the statement so a concurrent completion cannot be overwritten.
    pub async fn fail_unless_succeeded(&self, payment_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'FAILED', updated_at = NOW()
            WHERE id = $1 AND status <> 'SUCCEEDED'
            "#,
        )
        .bind(payment_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

async fn fetch_context<'e, E>(
    executor: E,
    reference: &str,
    lock: bool,
) -> Result<Option<PaymentContext>>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        r#"
        SELECT
            p.id AS payment_id,
            p.participation_request_id AS request_id,
            p.amount,
            p.reference,
            p.status AS payment_status,
            pr.user_id,
            u.email AS user_email,
            pr.status AS request_status,
            e.id AS event_id,
            e.title AS event_title,
            e.city AS event_city,
            e.event_date_time,
            e.max_participants
        FROM payments p
        INNER JOIN participation_requests pr ON pr.id = p.participation_request_id
        INNER JOIN events e ON e.id = pr.event_id
        INNER JOIN users u ON u.id = pr.user_id
        WHERE p.reference = $1
        {}
        "#,
        if lock { "FOR UPDATE OF p, pr" } else { "" }
    );

    let context = sqlx::query_as::<_, PaymentContext>(&sql)
        .bind(reference)
        .fetch_optional(executor)
        .await?;

    Ok(context)
}
