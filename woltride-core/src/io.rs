// IO element decoding: protocol codes to labeled, formatted readings.
// Invariants: decode is total and deterministic; unknown codes fall
// back to the raw string form instead of failing.

use crate::model::{IoData, IoValue};

pub const COLOR_GREEN: &str = "#10B981";
pub const COLOR_AMBER: &str = "#F59E0B";
pub const COLOR_RED: &str = "#EF4444";
pub const COLOR_BLUE: &str = "#3B82F6";
pub const COLOR_GRAY: &str = "#6B7280";

/// Curated subset shown in summary views, in fixed priority order:
/// battery %, battery voltage, GSM signal, ignition, motion, GPS fix.
pub const IMPORTANT_ELEMENTS: [u16; 6] = [113, 67, 21, 239, 240, 69];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IoIcon {
    pub family: &'static str,
    pub name: &'static str,
}

/// A decoded, display-ready telemetry reading.
#[derive(Clone, Debug, PartialEq)]
pub struct IoReading {
    pub label: String,
    pub value: String,
    pub icon: Option<IoIcon>,
    pub description: Option<&'static str>,
    pub color: Option<&'static str>,
}

/// Decode one telemetry element into a labeled reading.
pub fn decode(code: u16, value: &IoValue) -> IoReading {
    match code {
        21 => reading(
            "GSM Sinyali",
            format!("{}/5", value),
            icon("Ionicons", "cellular"),
            "GSM sinyal gücü (0-5)",
            None,
        ),
        24 => reading(
            "Hız",
            format!("{} km/h", value),
            icon("Ionicons", "speedometer"),
            "Araç hızı",
            None,
        ),
        66 => reading(
            "Harici Voltaj",
            millivolts(value),
            icon("MaterialIcons", "power"),
            "Harici güç kaynağı voltajı",
            None,
        ),
        67 => reading(
            "Batarya Voltajı",
            millivolts(value),
            icon("Ionicons", "battery-half"),
            "Dahili batarya voltajı",
            None,
        ),
        68 => reading(
            "Batarya Akımı",
            format!("{}mA", value),
            icon("Ionicons", "flash"),
            "Batarya akımı",
            None,
        ),
        69 => reading(
            "GPS Durumu",
            match value.as_i64() {
                Some(0) => "Yok".to_string(),
                Some(1) => "Var".to_string(),
                _ => "DGPS".to_string(),
            },
            icon("MaterialIcons", "gps-fixed"),
            "GPS kilit durumu",
            None,
        ),
        113 => reading(
            "Batarya Seviyesi",
            format!("{}%", value),
            icon("Ionicons", "battery-charging"),
            "Batarya yüzdesi",
            value.as_f64().map(|level| {
                if level > 60.0 {
                    COLOR_GREEN
                } else if level > 30.0 {
                    COLOR_AMBER
                } else {
                    COLOR_RED
                }
            }),
        ),
        181 => reading(
            "PDOP",
            tenths(value),
            icon("Ionicons", "location"),
            "Konum hassasiyeti",
            None,
        ),
        182 => reading(
            "HDOP",
            tenths(value),
            icon("Ionicons", "locate"),
            "Yatay hassasiyet",
            None,
        ),
        200 => reading(
            "Uyku Modu",
            match value.as_i64() {
                Some(0) => "Aktif".to_string(),
                _ => "Uyuyor".to_string(),
            },
            icon("Ionicons", "moon"),
            "Cihaz uyku durumu",
            None,
        ),
        239 => reading(
            "Kontak",
            match value.as_i64() {
                Some(0) => "Kapalı".to_string(),
                _ => "Açık".to_string(),
            },
            icon("Ionicons", "key"),
            "Kontak durumu",
            Some(if value.as_i64() == Some(1) {
                COLOR_GREEN
            } else {
                COLOR_GRAY
            }),
        ),
        240 => reading(
            "Hareket",
            match value.as_i64() {
                Some(0) => "Durgun".to_string(),
                _ => "Hareketli".to_string(),
            },
            icon("Ionicons", "walk"),
            "Hareket algılama",
            Some(if value.as_i64() == Some(1) {
                COLOR_BLUE
            } else {
                COLOR_GRAY
            }),
        ),
        241 => reading(
            "GSM Operatör",
            value.to_string(),
            icon("Ionicons", "phone-portrait"),
            "GSM operatör kodu",
            None,
        ),
        _ => IoReading {
            label: format!("IO {}", code),
            value: value.to_string(),
            icon: None,
            description: None,
            color: None,
        },
    }
}

/// Decode the important subset present in `io`, in priority order.
pub fn important_readings(io: &IoData) -> Vec<(u16, IoReading)> {
    IMPORTANT_ELEMENTS
        .iter()
        .filter_map(|code| io.elements.get(code).map(|value| (*code, decode(*code, value))))
        .collect()
}

fn reading(
    label: &str,
    value: String,
    icon: IoIcon,
    description: &'static str,
    color: Option<&'static str>,
) -> IoReading {
    IoReading {
        label: label.to_string(),
        value,
        icon: Some(icon),
        description: Some(description),
        color,
    }
}

fn icon(family: &'static str, name: &'static str) -> IoIcon {
    IoIcon { family, name }
}

/// Millivolt channels render as volts with two decimals.
fn millivolts(value: &IoValue) -> String {
    match value.as_f64() {
        Some(mv) => format!("{:.2}V", mv / 1000.0),
        None => value.to_string(),
    }
}

fn tenths(value: &IoValue) -> String {
    match value.as_f64() {
        Some(raw) => format!("{:.1}", raw / 10.0),
        None => value.to_string(),
    }
}
