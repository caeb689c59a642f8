//! PostgreSQL implementation of SubscriptionRepository.
//!
//! Uniqueness of `provider_subscription_id` is enforced by the table's
//! UNIQUE constraint; upsert relies on `ON CONFLICT` against it.

use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, Timestamp, UserId};
use crate::domain::subscription::{
    NewSubscription, Subscription, SubscriptionChanges, SubscriptionStatus,
};
use crate::ports::{SubscriptionRepository, UpsertOutcome};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const COLUMNS: &str = "id, user_id, provider_customer_id, provider_subscription_id, status, \
     price_id, start_date, end_date, trial_start, trial_end, created_at, updated_at";

/// PostgreSQL implementation of the SubscriptionRepository port.
pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: String,
    provider_customer_id: String,
    provider_subscription_id: String,
    status: String,
    price_id: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    trial_start: Option<DateTime<Utc>>,
    trial_end: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Row returned by the upsert, with Postgres's insert marker.
#[derive(Debug, sqlx::FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    subscription: SubscriptionRow,
    inserted: bool,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            user_id: UserId::new(row.user_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid user_id: {}", e))
            })?,
            provider_customer_id: row.provider_customer_id,
            provider_subscription_id: row.provider_subscription_id,
            status: parse_status(&row.status)?,
            price_id: row.price_id,
            start_date: Timestamp::from_datetime(row.start_date),
            end_date: Timestamp::from_datetime(row.end_date),
            trial_start: row.trial_start.map(Timestamp::from_datetime),
            trial_end: row.trial_end.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_status(s: &str) -> Result<SubscriptionStatus, DomainError> {
    SubscriptionStatus::parse(s).ok_or_else(|| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid status value: {}", s),
        )
    })
}

fn db_error(action: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Failed to {} subscription: {}", action, e),
    )
}

fn to_datetime(ts: &Option<Timestamp>) -> Option<DateTime<Utc>> {
    ts.map(|t| *t.as_datetime())
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn find_by_provider_id(
        &self,
        provider_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions WHERE provider_subscription_id = $1",
            COLUMNS
        ))
        .bind(provider_subscription_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find", e))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn insert(&self, fields: &NewSubscription) -> Result<Subscription, DomainError> {
        let row: SubscriptionRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO subscriptions (
                id, user_id, provider_customer_id, provider_subscription_id, status,
                price_id, start_date, end_date, trial_start, trial_end, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW(), NOW())
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(SubscriptionId::new().as_uuid())
        .bind(fields.user_id.as_str())
        .bind(&fields.provider_customer_id)
        .bind(&fields.provider_subscription_id)
        .bind(fields.status.as_str())
        .bind(&fields.price_id)
        .bind(fields.period.start().as_datetime())
        .bind(fields.period.end().as_datetime())
        .bind(to_datetime(&fields.trial_start))
        .bind(to_datetime(&fields.trial_end))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("subscriptions_provider_subscription_id_key") {
                    return DomainError::new(
                        ErrorCode::SubscriptionExists,
                        "Subscription already exists",
                    )
                    .with_detail("provider_subscription_id", &fields.provider_subscription_id);
                }
            }
            db_error("insert", e)
        })?;

        Subscription::try_from(row)
    }

    async fn update(
        &self,
        provider_subscription_id: &str,
        changes: &SubscriptionChanges,
    ) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            r#"
            UPDATE subscriptions SET
                status = $2,
                start_date = $3,
                end_date = $4,
                price_id = COALESCE($5, price_id),
                trial_start = $6,
                trial_end = $7,
                updated_at = NOW()
            WHERE provider_subscription_id = $1
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(provider_subscription_id)
        .bind(changes.status.as_str())
        .bind(changes.period.start().as_datetime())
        .bind(changes.period.end().as_datetime())
        .bind(changes.price_id.as_deref())
        .bind(to_datetime(&changes.trial_start))
        .bind(to_datetime(&changes.trial_end))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("update", e))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn upsert(&self, fields: &NewSubscription) -> Result<UpsertOutcome, DomainError> {
        let row: UpsertRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO subscriptions (
                id, user_id, provider_customer_id, provider_subscription_id, status,
                price_id, start_date, end_date, trial_start, trial_end, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW(), NOW())
            ON CONFLICT (provider_subscription_id) DO UPDATE SET
                status = EXCLUDED.status,
                start_date = EXCLUDED.start_date,
                end_date = EXCLUDED.end_date,
                price_id = EXCLUDED.price_id,
                trial_start = EXCLUDED.trial_start,
                trial_end = EXCLUDED.trial_end,
                updated_at = NOW()
            RETURNING {}, (xmax = 0) AS inserted
            "#,
            COLUMNS
        ))
        .bind(SubscriptionId::new().as_uuid())
        .bind(fields.user_id.as_str())
        .bind(&fields.provider_customer_id)
        .bind(&fields.provider_subscription_id)
        .bind(fields.status.as_str())
        .bind(&fields.price_id)
        .bind(fields.period.start().as_datetime())
        .bind(fields.period.end().as_datetime())
        .bind(to_datetime(&fields.trial_start))
        .bind(to_datetime(&fields.trial_end))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("upsert", e))?;

        let inserted = row.inserted;
        let subscription = Subscription::try_from(row.subscription)?;
        Ok(if inserted {
            UpsertOutcome::Inserted(subscription)
        } else {
            UpsertOutcome::Updated(subscription)
        })
    }

    async fn find_current_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM subscriptions
            WHERE user_id = $1
            ORDER BY status IN ('active', 'trialing') DESC, end_date DESC, created_at DESC
            LIMIT 1
            "#,
            COLUMNS
        ))
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find current", e))?;

        row.map(Subscription::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::subscription::BillingPeriod;

    fn row(status: &str) -> SubscriptionRow {
        let now = Utc::now();
        SubscriptionRow {
            id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            provider_customer_id: "cus_1".to_string(),
            provider_subscription_id: "sub_1".to_string(),
            status: status.to_string(),
            price_id: "price_1".to_string(),
            start_date: now,
            end_date: now,
            trial_start: None,
            trial_end: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn parse_status_works_for_all_values() {
        for status in SubscriptionStatus::ALL {
            assert_eq!(parse_status(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn parse_status_rejects_invalid_values() {
        assert!(parse_status("cancelled").is_err());
        assert!(parse_status("").is_err());
    }

    #[test]
    fn row_converts_to_subscription() {
        let row = row("past_due");
        let id = row.id;

        let sub = Subscription::try_from(row).unwrap();

        assert_eq!(sub.id.as_uuid(), &id);
        assert_eq!(sub.status, SubscriptionStatus::PastDue);
        assert!(sub.trial_start.is_none());
        assert!(sub.trial_end.is_some());
    }

    #[test]
    fn row_with_blank_user_is_rejected() {
        let mut row = row("active");
        row.user_id = String::new();

        let err = Subscription::try_from(row).unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    // ════════════════════════════════════════════════════════════════════════
    // Integration Tests (require Postgres, marked ignore)
    // ════════════════════════════════════════════════════════════════════════

    async fn live_repository() -> PostgresSubscriptionRepository {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPool::connect(&url).await.unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        PostgresSubscriptionRepository::new(pool)
    }

    fn fields(provider_id: &str, user: &str, status: SubscriptionStatus) -> NewSubscription {
        NewSubscription {
            user_id: UserId::new(user).unwrap(),
            provider_customer_id: "cus_pg".to_string(),
            provider_subscription_id: provider_id.to_string(),
            status,
            price_id: "price_pg".to_string(),
            period: BillingPeriod::from_unix_secs(1_700_000_000, 1_702_592_000).unwrap(),
            trial_start: None,
            trial_end: None,
        }
    }

    #[tokio::test]
    #[ignore = "Requires DATABASE_URL pointing at Postgres"]
    async fn upsert_inserts_then_updates_same_row() {
        let repo = live_repository().await;
        let provider_id = format!("sub_{}", Uuid::new_v4());
        let user = format!("user-{}", Uuid::new_v4());

        let first = repo
            .upsert(&fields(&provider_id, &user, SubscriptionStatus::Trialing))
            .await
            .unwrap();
        let second = repo
            .upsert(&fields(&provider_id, &user, SubscriptionStatus::Active))
            .await
            .unwrap();

        let inserted = match first {
            UpsertOutcome::Inserted(sub) => sub,
            other => panic!("expected insert, got {:?}", other),
        };
        let updated = match second {
            UpsertOutcome::Updated(sub) => sub,
            other => panic!("expected update, got {:?}", other),
        };
        assert_eq!(inserted.id, updated.id);
        assert_eq!(updated.status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    #[ignore = "Requires DATABASE_URL pointing at Postgres"]
    async fn rewritten_canceled_row_does_not_become_current() {
        let repo = live_repository().await;
        let user = format!("user-{}", Uuid::new_v4());
        let old_id = format!("sub_{}", Uuid::new_v4());
        let new_id = format!("sub_{}", Uuid::new_v4());
        let old = fields(&old_id, &user, SubscriptionStatus::Canceled);

        repo.upsert(&old).await.unwrap();
        repo.upsert(&fields(&new_id, &user, SubscriptionStatus::Active))
            .await
            .unwrap();
        repo.update(&old_id, &old.changes()).await.unwrap();

        let current = repo
            .find_current_for_user(&UserId::new(user).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.provider_subscription_id, new_id);
        assert_eq!(current.status, SubscriptionStatus::Active);
    }
}
