//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresSubscriptionRepository` - Subscription mirror with atomic upsert

mod subscription_repository;

pub use subscription_repository::PostgresSubscriptionRepository;
