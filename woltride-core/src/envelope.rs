// Inbound websocket envelope decoding.
// Invariants: unknown message types are ignored, not errors; a bad
// device entry is skipped without failing the rest of the batch.

use serde::Deserialize;
use thiserror::Error;

use crate::model::DeviceSnapshot;

pub const DEVICE_UPDATE_TYPE: &str = "device_update";

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("frame is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("device_update frame has no data array")]
    MissingData,
}

/// Payload of a `device_update` frame: the complete fleet as of this
/// update, plus the number of entries dropped at decode time.
#[derive(Clone, Debug)]
pub struct DeviceUpdate {
    pub devices: Vec<DeviceSnapshot>,
    pub skipped: usize,
}

/// Decoded message wrapper distinguishing message type from payload.
#[derive(Clone, Debug)]
pub enum Envelope {
    DeviceUpdate(DeviceUpdate),
    Ignored { message_type: String },
}

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    message_type: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

pub fn decode(raw: &str) -> Result<Envelope, EnvelopeError> {
    let envelope: RawEnvelope = serde_json::from_str(raw)?;
    if envelope.message_type != DEVICE_UPDATE_TYPE {
        return Ok(Envelope::Ignored {
            message_type: envelope.message_type,
        });
    }

    let Some(serde_json::Value::Array(entries)) = envelope.data else {
        return Err(EnvelopeError::MissingData);
    };

    let mut devices = Vec::with_capacity(entries.len());
    let mut skipped = 0;
    for entry in entries {
        match serde_json::from_value::<DeviceSnapshot>(entry) {
            Ok(device) => devices.push(device),
            Err(_) => skipped += 1,
        }
    }

    Ok(Envelope::DeviceUpdate(DeviceUpdate { devices, skipped }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_device_update() {
        let raw = r#"{"type":"device_update","data":[
            {"imei":"868120","status":"online","gps":{"latitude":41.0,"longitude":29.0,"speed":12.5}}
        ]}"#;
        let Envelope::DeviceUpdate(update) = decode(raw).unwrap() else {
            panic!("expected device_update");
        };
        assert_eq!(update.devices.len(), 1);
        assert_eq!(update.skipped, 0);
        assert_eq!(update.devices[0].imei, "868120");
    }

    #[test]
    fn unknown_type_is_ignored_not_error() {
        let decoded = decode(r#"{"type":"heartbeat","data":{}}"#).unwrap();
        let Envelope::Ignored { message_type } = decoded else {
            panic!("expected ignored envelope");
        };
        assert_eq!(message_type, "heartbeat");
    }

    #[test]
    fn bad_entry_is_skipped_without_failing_batch() {
        let raw = r#"{"type":"device_update","data":[
            {"imei":"A","gps":{"latitude":41.0,"longitude":29.0}},
            {"imei":"B","status":"rebooting"},
            42
        ]}"#;
        let Envelope::DeviceUpdate(update) = decode(raw).unwrap() else {
            panic!("expected device_update");
        };
        assert_eq!(update.devices.len(), 1);
        assert_eq!(update.skipped, 2);
    }

    #[test]
    fn non_json_frame_is_an_error() {
        assert!(matches!(decode("not json"), Err(EnvelopeError::Json(_))));
    }

    #[test]
    fn device_update_without_data_array_is_an_error() {
        assert!(matches!(
            decode(r#"{"type":"device_update"}"#),
            Err(EnvelopeError::MissingData)
        ));
        assert!(matches!(
            decode(r#"{"type":"device_update","data":{}}"#),
            Err(EnvelopeError::MissingData)
        ));
    }
}
