// Presentation collaborator interfaces and the console presenter.
// Map rendering and navigation live outside this core; they consume
// these calls.

use tracing::{debug, info};

use woltride_core::io;
use woltride_core::model::{DeviceSnapshot, DeviceStatus};

/// Outbound interface to the presentation layer.
pub trait Presenter: Send + Sync {
    fn on_device_list_changed(&self, devices: &[DeviceSnapshot]);
    fn on_selection_changed(&self, imei: Option<&str>);
    fn request_navigate_to_detail(&self, imei: &str);
    fn request_camera_move(&self, latitude: f64, longitude: f64);
}

/// Headless presenter logging through tracing; stands in for the map
/// and navigation screens.
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn on_device_list_changed(&self, devices: &[DeviceSnapshot]) {
        debug!(devices = devices.len(), "device list updated");
    }

    fn on_selection_changed(&self, imei: Option<&str>) {
        match imei {
            Some(imei) => info!(imei, "device selected"),
            None => info!("selection cleared"),
        }
    }

    fn request_navigate_to_detail(&self, imei: &str) {
        info!(imei, "navigate to device detail");
    }

    fn request_camera_move(&self, latitude: f64, longitude: f64) {
        info!(latitude, longitude, "camera move requested");
    }
}

/// Decoded detail rows for one device, in the order the detail screen
/// shows them: identity, status, GPS block, then IO elements.
pub fn detail_lines(device: &DeviceSnapshot) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!("IMEI: {}", device.imei));
    lines.push(format!(
        "Durum: {}",
        match device.status {
            DeviceStatus::Online => "Çevrimiçi",
            DeviceStatus::Offline => "Çevrimdışı",
        }
    ));
    lines.push(format!(
        "Atanan Scooter: {}",
        device.assigned_scooter.as_deref().unwrap_or("Atanmamış")
    ));
    if let Some(last_seen) = &device.last_seen {
        lines.push(format!("Son Görülme: {}", last_seen));
    }

    if let Some(gps) = &device.gps {
        lines.push(format!("Enlem: {:.6}", gps.latitude));
        lines.push(format!("Boylam: {:.6}", gps.longitude));
        lines.push(format!("Yükseklik: {} m", gps.altitude));
        lines.push(format!("Hız: {} km/h", gps.speed.round() as i64));
        lines.push(format!("Yön: {}°", gps.angle));
        lines.push(format!("Uydu Sayısı: {}", gps.satellites));
    }

    if let Some(io_data) = &device.io {
        lines.push(format!("Event ID: {}", io_data.event_id));
        lines.push(format!("Element Sayısı: {}", io_data.element_count));
        for (code, value) in &io_data.elements {
            let reading = io::decode(*code, value);
            lines.push(format!("{}: {}", reading.label, reading.value));
        }
    }

    lines
}
