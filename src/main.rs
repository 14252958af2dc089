use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use postfeed_sync::domain::auth::AppAuth;
use postfeed_sync::domain::feed::{FeedAssembler, FeedRemoteMediator, FeedService, NewerFeedState};
use postfeed_sync::infrastructure::api::{HttpPostApi, PostApi};
use postfeed_sync::infrastructure::config::{Config, LogFormat};
use postfeed_sync::infrastructure::db::{check_connection, create_pool};
use postfeed_sync::infrastructure::repositories::{PostRemoteKeyRepository, PostRepository};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting postfeed sync against {}",
        config.api_base_url
    );

    // Open the local feed cache
    let pool = create_pool(&config.database_url).await?;
    check_connection(&pool).await?;
    tracing::info!("Feed cache ready at {}", config.database_url);

    let pool = Arc::new(pool);

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Instantiate repositories (inject db pool)
    let posts = Arc::new(PostRepository::new(pool.clone()));
    let keys = Arc::new(PostRemoteKeyRepository::new(pool.clone()));

    // 2. Instantiate the auth holder and the backend client
    let auth = Arc::new(AppAuth::new());
    let api: Arc<dyn PostApi> = Arc::new(HttpPostApi::new(
        config.api_base_url.clone(),
        auth.clone(),
    ));

    // 3. Instantiate the sync core (inject repositories and client)
    let mediator = Arc::new(FeedRemoteMediator::new(
        pool.clone(),
        api.clone(),
        posts.clone(),
        keys.clone(),
        config.page_size,
        config.refresh_policy,
    ));
    let feed = FeedService::new(
        posts.clone(),
        api.clone(),
        mediator,
        FeedAssembler::new(config.ad_every),
        auth.clone(),
        config.page_size,
        Duration::from_secs(config.newer_poll_interval_secs),
    );
    let _identity_listener = feed.start();
    let poller = feed.start_poller();

    if let Err(err) = feed.refresh().await {
        tracing::warn!(error = %err, "initial refresh failed");
    }

    let mut items = feed.items();
    let mut newer = feed.newer_state();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                break;
            }
            changed = items.changed() => {
                if changed.is_err() {
                    break;
                }
                tracing::info!(items = items.borrow().len(), "feed window updated");
            }
            changed = newer.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = newer.borrow().clone();
                match state {
                    NewerFeedState::Count(count) if count > 0 => {
                        tracing::info!(count, "newer posts available");
                    }
                    NewerFeedState::Count(_) => {}
                    NewerFeedState::Failed { kind, message } => {
                        tracing::warn!(?kind, message, "newer poller stopped");
                    }
                }
            }
        }
    }

    poller.shutdown().await;
    Ok(())
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "postfeed_sync=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "postfeed_sync=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
