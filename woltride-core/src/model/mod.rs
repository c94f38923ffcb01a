// Core data models for device snapshots and raw telemetry elements.

mod device;

pub use device::{DeviceSnapshot, DeviceStatus, GpsFix, IoData, IoValue};
