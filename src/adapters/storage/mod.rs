//! Storage Adapters
//!
//! In-process implementations of the SubscriptionRepository port for tests
//! and local runs without a database.

mod in_memory_subscription_repository;

pub use in_memory_subscription_repository::InMemorySubscriptionRepository;
