// Device state store: bridges hub deliveries into the fleet tracker
// and drives the presentation interfaces.
// Invariants: the tracker owns the snapshot collection exclusively;
// validity filtering happens here on every update, never in consumers.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use woltride_core::envelope::{DeviceUpdate, Envelope};
use woltride_core::fleet::{FleetTracker, SelectAction};
use woltride_core::model::DeviceSnapshot;

use crate::hub::{Subscription, SubscriptionHub};
use crate::present::Presenter;

pub struct DeviceStore {
    tracker: Mutex<FleetTracker>,
    presenter: Arc<dyn Presenter>,
}

impl DeviceStore {
    pub fn new(presenter: Arc<dyn Presenter>) -> Self {
        Self {
            tracker: Mutex::new(FleetTracker::new()),
            presenter,
        }
    }

    /// Subscribe this store to a hub; it reacts to `device_update`
    /// envelopes and ignores everything else.
    pub fn attach(self: &Arc<Self>, hub: &SubscriptionHub) -> Subscription {
        let store = Arc::clone(self);
        hub.subscribe(move |envelope| {
            if let Envelope::DeviceUpdate(update) = envelope {
                store.apply_update(update.clone());
            }
        })
    }

    /// Replace the visible collection with the filtered update and
    /// notify presentation.
    pub fn apply_update(&self, update: DeviceUpdate) {
        let (devices, outcome) = {
            let mut tracker = self.tracker();
            let outcome = tracker.apply_update(update.devices);
            (tracker.devices().cloned().collect::<Vec<_>>(), outcome)
        };

        if outcome.dropped > 0 {
            debug!(dropped = outcome.dropped, "invalid device entries filtered");
        }
        self.presenter.on_device_list_changed(&devices);
        if outcome.selection_cleared {
            self.presenter.on_selection_changed(None);
        }
    }

    /// First press focuses the camera on the device; a second press on
    /// the same device requests navigation to the detail view.
    pub fn select(&self, imei: &str) {
        let action = self.tracker().select(imei);
        match action {
            Some(SelectAction::FocusCamera {
                latitude,
                longitude,
            }) => {
                self.presenter.on_selection_changed(Some(imei));
                self.presenter.request_camera_move(latitude, longitude);
            }
            Some(SelectAction::NavigateToDetail) => {
                self.presenter.request_navigate_to_detail(imei);
            }
            None => {}
        }
    }

    pub fn clear_selection(&self) {
        let had_selection = {
            let mut tracker = self.tracker();
            let had = tracker.selected().is_some();
            tracker.clear_selection();
            had
        };
        if had_selection {
            self.presenter.on_selection_changed(None);
        }
    }

    pub fn selected(&self) -> Option<String> {
        self.tracker().selected().map(str::to_string)
    }

    pub fn get(&self, imei: &str) -> Option<DeviceSnapshot> {
        self.tracker().get(imei).cloned()
    }

    pub fn devices(&self) -> Vec<DeviceSnapshot> {
        self.tracker().devices().cloned().collect()
    }

    pub fn total(&self) -> usize {
        self.tracker().total()
    }

    pub fn online_count(&self) -> usize {
        self.tracker().online_count()
    }

    pub fn moving_count(&self) -> usize {
        self.tracker().moving_count()
    }

    fn tracker(&self) -> MutexGuard<'_, FleetTracker> {
        self.tracker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use woltride_core::model::{DeviceStatus, GpsFix};

    #[derive(Debug, PartialEq)]
    enum Event {
        ListChanged(usize),
        SelectionChanged(Option<String>),
        Navigate(String),
        CameraMove(f64, f64),
    }

    #[derive(Default)]
    struct RecordingPresenter {
        events: Mutex<Vec<Event>>,
    }

    impl RecordingPresenter {
        fn take(&self) -> Vec<Event> {
            std::mem::take(&mut self.events.lock().unwrap())
        }
    }

    impl Presenter for RecordingPresenter {
        fn on_device_list_changed(&self, devices: &[DeviceSnapshot]) {
            self.events
                .lock()
                .unwrap()
                .push(Event::ListChanged(devices.len()));
        }

        fn on_selection_changed(&self, imei: Option<&str>) {
            self.events
                .lock()
                .unwrap()
                .push(Event::SelectionChanged(imei.map(str::to_string)));
        }

        fn request_navigate_to_detail(&self, imei: &str) {
            self.events
                .lock()
                .unwrap()
                .push(Event::Navigate(imei.to_string()));
        }

        fn request_camera_move(&self, latitude: f64, longitude: f64) {
            self.events
                .lock()
                .unwrap()
                .push(Event::CameraMove(latitude, longitude));
        }
    }

    fn device(imei: &str, latitude: f64, longitude: f64, speed: f64) -> DeviceSnapshot {
        DeviceSnapshot {
            imei: imei.to_string(),
            status: DeviceStatus::Online,
            gps: Some(GpsFix {
                latitude,
                longitude,
                altitude: 0.0,
                speed,
                angle: 0.0,
                satellites: 0,
            }),
            assigned_scooter: None,
            last_seen: None,
            io: None,
        }
    }

    fn update(devices: Vec<DeviceSnapshot>) -> DeviceUpdate {
        DeviceUpdate {
            devices,
            skipped: 0,
        }
    }

    #[test]
    fn double_select_emits_one_navigate_and_one_camera_move() {
        let presenter = Arc::new(RecordingPresenter::default());
        let store = DeviceStore::new(presenter.clone());
        store.apply_update(update(vec![device("A", 41.0, 29.0, 0.0)]));
        presenter.take();

        store.select("A");
        store.select("A");

        assert_eq!(
            presenter.take(),
            vec![
                Event::SelectionChanged(Some("A".to_string())),
                Event::CameraMove(41.0, 29.0),
                Event::Navigate("A".to_string()),
            ]
        );
    }

    #[test]
    fn update_dropping_selected_device_clears_selection() {
        let presenter = Arc::new(RecordingPresenter::default());
        let store = DeviceStore::new(presenter.clone());
        store.apply_update(update(vec![device("A", 41.0, 29.0, 0.0)]));
        store.select("A");
        presenter.take();

        store.apply_update(update(vec![device("B", 40.0, 28.0, 0.0)]));
        assert_eq!(
            presenter.take(),
            vec![Event::ListChanged(1), Event::SelectionChanged(None)]
        );
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn attached_store_applies_hub_device_updates() {
        let presenter = Arc::new(RecordingPresenter::default());
        let store = Arc::new(DeviceStore::new(presenter.clone()));
        let hub = SubscriptionHub::new();
        let _sub = store.attach(&hub);

        hub.publish(&Envelope::DeviceUpdate(update(vec![
            device("A", 41.0, 29.0, 3.0),
            device("B", 999.0, 29.0, 5.0),
        ])));
        hub.publish(&Envelope::Ignored {
            message_type: "heartbeat".to_string(),
        });

        assert_eq!(store.total(), 1);
        assert_eq!(store.moving_count(), 1);
        assert_eq!(presenter.take(), vec![Event::ListChanged(1)]);
    }

    #[test]
    fn clear_selection_notifies_once() {
        let presenter = Arc::new(RecordingPresenter::default());
        let store = DeviceStore::new(presenter.clone());
        store.apply_update(update(vec![device("A", 41.0, 29.0, 0.0)]));
        store.select("A");
        presenter.take();

        store.clear_selection();
        store.clear_selection();
        assert_eq!(presenter.take(), vec![Event::SelectionChanged(None)]);
    }
}
