use std::error::Error;
use std::sync::Arc;

use booking_payments::{
    config::Config,
    events::creation_feed,
    messaging::LogDispatcher,
    routes,
    state::AppState,
    store::SqliteStore,
    verification::AlwaysConfirm,
};
use dotenvy::dotenv;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "booking_payments=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    // Nothing in this binary inserts bookings; the platform delivers
    // creation events over HTTP instead. Embedders that insert through the
    // store can run `spawn_booking_created_listener` on this feed.
    let store = Arc::new(SqliteStore::connect(&config, creation_feed()).await?);

    let app_state = AppState::new(
        store.clone(),
        store,
        Arc::new(LogDispatcher),
        Arc::new(AlwaysConfirm),
    )
    .with_events_token(config.events_token.clone());
    if app_state.events_token.is_none() {
        tracing::warn!("EVENTS_TOKEN not set; booking events will be refused");
    }

    let app = routes::router(app_state);

    // run it with hyper
    tracing::debug!("listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
