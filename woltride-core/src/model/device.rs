// Wire-facing device snapshot types.
// Invariants: coordinate fields never fail deserialization; non-numeric
// input becomes NaN, which fails the fix validity check downstream.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// A single GPS position reading with quality and motion attributes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GpsFix {
    #[serde(default = "nan", deserialize_with = "lenient_coord")]
    pub latitude: f64,
    #[serde(default = "nan", deserialize_with = "lenient_coord")]
    pub longitude: f64,
    #[serde(default)]
    pub altitude: f64,
    /// Speed in km/h.
    #[serde(default)]
    pub speed: f64,
    /// Heading in degrees, 0-360.
    #[serde(default)]
    pub angle: f64,
    #[serde(default)]
    pub satellites: u32,
}

impl GpsFix {
    /// A fix is valid when both coordinates are finite and in range.
    /// 0.0 is a valid coordinate; only non-numeric or out-of-range
    /// values reject the fix.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    #[default]
    Offline,
}

/// Raw telemetry element value as delivered on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IoValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl IoValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            IoValue::Int(value) => Some(*value as f64),
            IoValue::Float(value) => Some(*value),
            IoValue::Text(value) => value.parse().ok(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            IoValue::Int(value) => Some(*value),
            IoValue::Float(value) if value.fract() == 0.0 => Some(*value as i64),
            IoValue::Float(_) => None,
            IoValue::Text(value) => value.parse().ok(),
        }
    }
}

impl fmt::Display for IoValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoValue::Int(value) => write!(f, "{}", value),
            IoValue::Float(value) => write!(f, "{}", value),
            IoValue::Text(value) => write!(f, "{}", value),
        }
    }
}

/// IO element block of a device snapshot. `element_count` is
/// informational only and is never validated against `elements`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IoData {
    #[serde(default)]
    pub event_id: i64,
    #[serde(default)]
    pub element_count: u32,
    #[serde(default)]
    pub elements: BTreeMap<u16, IoValue>,
}

/// Complete state of one tracked device as carried in a
/// `device_update` message.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSnapshot {
    #[serde(default)]
    pub imei: String,
    #[serde(default)]
    pub status: DeviceStatus,
    #[serde(default)]
    pub gps: Option<GpsFix>,
    #[serde(default)]
    pub assigned_scooter: Option<String>,
    /// Opaque timestamp string, passed through for display.
    #[serde(default)]
    pub last_seen: Option<String>,
    #[serde(default)]
    pub io: Option<IoData>,
}

fn nan() -> f64 {
    f64::NAN
}

fn lenient_coord<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64().unwrap_or(f64::NAN))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_numeric_coordinates_become_invalid_fix() {
        let fix: GpsFix =
            serde_json::from_str(r#"{"latitude":"41.0","longitude":29.0}"#).unwrap();
        assert!(fix.latitude.is_nan());
        assert!(!fix.is_valid());
    }

    #[test]
    fn zero_coordinates_are_valid() {
        let fix: GpsFix = serde_json::from_str(r#"{"latitude":0.0,"longitude":0.0}"#).unwrap();
        assert!(fix.is_valid());
    }

    #[test]
    fn out_of_range_latitude_is_invalid() {
        let fix: GpsFix = serde_json::from_str(r#"{"latitude":999,"longitude":29.0}"#).unwrap();
        assert!(!fix.is_valid());
    }

    #[test]
    fn snapshot_defaults_apply_for_missing_fields() {
        let device: DeviceSnapshot = serde_json::from_str(r#"{"imei":"868120"}"#).unwrap();
        assert_eq!(device.status, DeviceStatus::Offline);
        assert!(device.gps.is_none());
        assert!(device.io.is_none());
    }

    #[test]
    fn io_elements_parse_from_string_keys() {
        let io: IoData = serde_json::from_str(
            r#"{"eventId":240,"elementCount":2,"elements":{"113":87,"241":"28601"}}"#,
        )
        .unwrap();
        assert_eq!(io.elements.get(&113), Some(&IoValue::Int(87)));
        assert_eq!(io.elements.get(&241), Some(&IoValue::Text("28601".into())));
    }
}
