use std::sync::Arc;

use anyhow::Context;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use subscription_sync::adapters::access::HttpAccessGrantee;
use subscription_sync::adapters::http::{subscription_router, SubscriptionAppState};
use subscription_sync::adapters::postgres::PostgresSubscriptionRepository;
use subscription_sync::adapters::storage::InMemorySubscriptionRepository;
use subscription_sync::adapters::stripe::StripeWebhookVerifier;
use subscription_sync::config::{AppConfig, LogFormat};
use subscription_sync::ports::SubscriptionRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;

    init_tracing(&config);
    config.validate().context("validating configuration")?;

    tracing::info!(
        environment = ?config.server.environment,
        "Starting subscription sync..."
    );

    let repository: Arc<dyn SubscriptionRepository> = if config.database.is_configured() {
        tracing::info!("Connecting to database...");
        let pool = config
            .database
            .connect()
            .await
            .context("connecting to database")?;
        if config.database.run_migrations {
            tracing::info!("Running migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("running migrations")?;
        }
        Arc::new(PostgresSubscriptionRepository::new(pool))
    } else {
        tracing::warn!("No database URL configured, using in-memory subscription store");
        Arc::new(InMemorySubscriptionRepository::new())
    };

    if !config.payment.has_webhook_secret() {
        tracing::warn!("Webhook signing secret not configured, every delivery will be rejected");
    }
    let verifier = Arc::new(StripeWebhookVerifier::new(
        config.payment.stripe_webhook_secret.clone(),
    ));

    let mut state = SubscriptionAppState::new(repository, verifier);
    if let Some(url) = &config.access.grant_webhook_url {
        tracing::info!(url = %url, "Access grants forwarded to callback");
        let grantee = HttpAccessGrantee::new(url.clone(), config.access.timeout())
            .context("building grant callback client")?;
        state = state.with_grantee(Arc::new(grantee));
    }
    match &config.access.api_token {
        Some(token) => state = state.with_access_token(token.clone()),
        None => tracing::warn!("No access API token configured; /api/access routes are open"),
    }

    let app = subscription_router()
        .with_state(state)
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    match config.server.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
}
