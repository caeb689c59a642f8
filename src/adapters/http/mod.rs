//! HTTP adapters - REST API implementations.

pub mod middleware;
pub mod subscription;

pub use middleware::RequireAccessToken;
pub use subscription::{subscription_router, SubscriptionAppState};
