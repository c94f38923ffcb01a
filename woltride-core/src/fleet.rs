// Fleet snapshot tracking and selection state.
// Invariants: the visible set is always exactly the most recently
// delivered collection, filtered for validity; selection is explicit
// state, never reconstructed from the snapshot.

use std::collections::BTreeMap;

use crate::model::{DeviceSnapshot, DeviceStatus};

/// Follow-up requested from the presentation layer by a selection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SelectAction {
    /// First press on a device: move the camera to it.
    FocusCamera { latitude: f64, longitude: f64 },
    /// Second press on the already-selected device: drill into detail.
    NavigateToDetail,
}

/// Result of applying one device update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Entries dropped by the validity filter.
    pub dropped: usize,
    /// True when the selected device was not in this update.
    pub selection_cleared: bool,
}

/// Authoritative current snapshot of all known devices, keyed by IMEI.
#[derive(Debug, Default)]
pub struct FleetTracker {
    devices: BTreeMap<String, DeviceSnapshot>,
    selected: Option<String>,
}

impl FleetTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the visible collection with the filtered update.
    /// Devices absent from the update disappear; there is no explicit
    /// removal event. Last value wins for a repeated IMEI.
    pub fn apply_update(&mut self, update: Vec<DeviceSnapshot>) -> ApplyOutcome {
        let mut next = BTreeMap::new();
        let mut dropped = 0;
        for device in update {
            if Self::is_renderable(&device) {
                next.insert(device.imei.clone(), device);
            } else {
                dropped += 1;
            }
        }
        self.devices = next;

        let selection_cleared = match &self.selected {
            Some(imei) if !self.devices.contains_key(imei) => {
                self.selected = None;
                true
            }
            _ => false,
        };

        ApplyOutcome {
            dropped,
            selection_cleared,
        }
    }

    /// Centralized validity rule: a device is visible only with a
    /// non-empty identifier and a valid GPS fix. Applied on every
    /// update, not at display time; consumers never re-filter.
    fn is_renderable(device: &DeviceSnapshot) -> bool {
        !device.imei.is_empty()
            && device.gps.as_ref().map(|gps| gps.is_valid()).unwrap_or(false)
    }

    pub fn devices(&self) -> impl Iterator<Item = &DeviceSnapshot> {
        self.devices.values()
    }

    pub fn get(&self, imei: &str) -> Option<&DeviceSnapshot> {
        self.devices.get(imei)
    }

    pub fn total(&self) -> usize {
        self.devices.len()
    }

    pub fn online_count(&self) -> usize {
        self.devices
            .values()
            .filter(|device| device.status == DeviceStatus::Online)
            .count()
    }

    pub fn moving_count(&self) -> usize {
        self.devices
            .values()
            .filter(|device| device.gps.as_ref().map(|gps| gps.speed > 0.0).unwrap_or(false))
            .count()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Select a device. The first press focuses the camera; pressing
    /// the already-selected device requests navigation to detail.
    /// Selecting an unknown identifier is a no-op.
    pub fn select(&mut self, imei: &str) -> Option<SelectAction> {
        let device = self.devices.get(imei)?;
        if self.selected.as_deref() == Some(imei) {
            return Some(SelectAction::NavigateToDetail);
        }
        let gps = device.gps.as_ref()?;
        let action = SelectAction::FocusCamera {
            latitude: gps.latitude,
            longitude: gps.longitude,
        };
        self.selected = Some(imei.to_string());
        Some(action)
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }
}
