// Background tasks for periodic fleet statistics.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tracing::{debug, info};

use woltride_core::io;

use crate::store::DeviceStore;

/// Log the header stats (total / online / moving) on a fixed interval,
/// with per-device important readings at debug level.
pub async fn stats_task(store: Arc<DeviceStore>, period: Duration) {
    let mut interval = time::interval(period);
    loop {
        interval.tick().await;
        if store.total() == 0 {
            continue;
        }

        info!(
            total = store.total(),
            online = store.online_count(),
            moving = store.moving_count(),
            "fleet stats"
        );

        for device in store.devices() {
            let Some(io_data) = &device.io else {
                continue;
            };
            let summary: Vec<String> = io::important_readings(io_data)
                .into_iter()
                .map(|(_, reading)| format!("{}={}", reading.label, reading.value))
                .collect();
            if !summary.is_empty() {
                debug!(imei = %device.imei, readings = %summary.join(", "), "device readings");
            }
        }
    }
}
