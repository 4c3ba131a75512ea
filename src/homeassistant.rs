// MIT License - Copyright (c) 2026 Peter Wright
// Rust translation of the Home Assistant discovery payloads

use serde::Serialize;

use crate::devices::identity::PanelIdentity;
use crate::devices::zone::Zone;

pub const MANUFACTURER: &str = "Interlogix";

/// Object id used in topics and unique ids, e.g. `concord_zone_5`.
pub fn zone_object_id(zone_id: u32) -> String {
    format!("concord_zone_{zone_id}")
}

pub fn config_topic(discover_base: &str, zone_id: u32) -> String {
    format!(
        "{discover_base}/binary_sensor/{}/config",
        zone_object_id(zone_id)
    )
}

pub fn state_topic(discover_base: &str, zone_id: u32) -> String {
    format!(
        "{discover_base}/binary_sensor/{}/state",
        zone_object_id(zone_id)
    )
}

/// `ON` for any non-zero status byte.
pub fn state_payload(zone: &Zone) -> &'static str {
    if zone.is_active() { "ON" } else { "OFF" }
}

/// Guess a binary sensor device class from the zone name.
///
/// Later matches win, so "Window Door Motion" is a window.
pub fn device_class(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    let mut class = "opening";
    if lower.contains("motion") {
        class = "motion";
    }
    if lower.contains("door") {
        class = "door";
    }
    if lower.contains("window") {
        class = "window";
    }
    class
}

/// Lower-case the name, then capitalise the first letter of every word.
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut word_start = true;
    for c in name.to_lowercase().chars() {
        if word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        word_start = !(c.is_alphanumeric() || c == '_');
    }
    out
}

/// Device block shared by every zone of one panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveryDevice {
    pub identifiers: String,
    pub manufacturer: String,
    pub model: String,
    pub name: String,
    pub sw_version: String,
}

impl DiscoveryDevice {
    pub fn new(identity: &PanelIdentity) -> Self {
        Self {
            identifiers: identity.serial_number.to_string(),
            manufacturer: MANUFACTURER.to_string(),
            model: identity.hardware_version.clone(),
            name: identity.panel_type.name().to_string(),
            sw_version: identity.software_version.clone(),
        }
    }
}

/// Retained discovery document for one zone's binary sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneDiscovery {
    pub name: String,
    pub device_class: String,
    pub state_topic: String,
    pub unique_id: String,
    pub device: DiscoveryDevice,
}

impl ZoneDiscovery {
    pub fn new(discover_base: &str, zone: &Zone, identity: &PanelIdentity) -> Self {
        Self {
            name: title_case(&zone.name),
            device_class: device_class(&zone.name).to_string(),
            state_topic: state_topic(discover_base, zone.id),
            unique_id: format!("{}-{}", identity.serial_number, zone_object_id(zone.id)),
            device: DiscoveryDevice::new(identity),
        }
    }
}
