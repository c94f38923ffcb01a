// Live fleet telemetry client for Woltride Technic.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use woltride_client::conn::ws::WsTransport;
use woltride_client::conn::ConnectionManager;
use woltride_client::constants::{DEFAULT_ENDPOINT, RECONNECT_DELAY_MS, STATS_INTERVAL_SECS};
use woltride_client::hub::SubscriptionHub;
use woltride_client::present::LogPresenter;
use woltride_client::store::DeviceStore;
use woltride_client::tasks;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let endpoint = env::var("WOLTRIDE_WS_URL").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
    let stats_interval = env::var("WOLTRIDE_STATS_INTERVAL_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(STATS_INTERVAL_SECS);

    let hub = SubscriptionHub::new();
    let store = Arc::new(DeviceStore::new(Arc::new(LogPresenter)));
    let _subscription = store.attach(&hub);

    let (manager, driver) = ConnectionManager::new(
        WsTransport::new(endpoint.clone()),
        hub.clone(),
        Duration::from_millis(RECONNECT_DELAY_MS),
    );
    tokio::spawn(driver);

    let mut state_rx = manager.watch_state();
    tokio::spawn(async move {
        while state_rx.changed().await.is_ok() {
            let state = *state_rx.borrow();
            info!(?state, "connection state");
        }
    });

    let stats_store = store.clone();
    tokio::spawn(async move {
        tasks::stats_task(stats_store, Duration::from_secs(stats_interval)).await;
    });

    info!(%endpoint, "starting fleet client");
    manager.connect().await;

    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(?err, "ctrl-c wait failed");
    }
    info!("shutting down");
    manager.disconnect().await;
}
