// MIT License - Copyright (c) 2026 Peter Wright
// Rust translation of the panel type decoding

use crate::constants::PanelType;

/// Model, revision and serial number of the attached panel.
///
/// Established once per session from the `PanelType` frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelIdentity {
    pub panel_type: PanelType,
    pub hardware_version: String,
    pub software_version: String,
    pub serial_number: u32,
}

impl PanelIdentity {
    /// Parse a `PanelType` payload (command byte included).
    ///
    /// Layout: `01 <type> <hw hi> <hw lo> <sw hi> <sw lo> <serial x4>`.
    /// Returns `None` if the payload is too short.
    pub fn decode(payload: &[u8]) -> Option<Self> {
        let &[_, type_code, hw_hi, hw_lo, sw_hi, sw_lo, s0, s1, s2, s3, ..] = payload else {
            return None;
        };
        let panel_type = PanelType::from_u8(type_code);

        let (hardware_version, software_version) = if panel_type.is_concord() {
            (
                concord_hardware_version(hw_hi, hw_lo),
                u16::from_be_bytes([sw_hi, sw_lo]).to_string(),
            )
        } else {
            (format!("{hw_hi}.{hw_lo}"), format!("{sw_hi}.{sw_lo}"))
        };

        Some(Self {
            panel_type,
            hardware_version,
            software_version,
            serial_number: u32::from_be_bytes([s0, s1, s2, s3]),
        })
    }
}

/// Concord hardware revisions are a letter (1 = A) followed by a digit.
fn concord_hardware_version(letter: u8, digit: u8) -> String {
    let letter = match letter {
        1..=26 => char::from(b'A' + letter - 1),
        _ => '?',
    };
    let digit = match digit {
        0..=9 => char::from(b'0' + digit),
        _ => '?',
    };
    format!("{letter}{digit}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concord_identity() {
        let payload = [0x01, 0x14, 0x07, 0x01, 0x40, 0x92, 0x01, 0x45, 0x10, 0x76];
        let identity = PanelIdentity::decode(&payload).unwrap();
        assert_eq!(identity.panel_type, PanelType::Concord);
        assert_eq!(identity.hardware_version, "G1");
        assert_eq!(identity.software_version, "16530");
        assert_eq!(identity.serial_number, 0x0145_1076);
    }

    #[test]
    fn test_advent_identity_is_dotted() {
        let payload = [0x01, 0x11, 0x02, 0x05, 0x03, 0x0A, 0x00, 0x00, 0x01, 0x00];
        let identity = PanelIdentity::decode(&payload).unwrap();
        assert_eq!(identity.panel_type, PanelType::AdventHomeNavigator250);
        assert_eq!(identity.hardware_version, "2.5");
        assert_eq!(identity.software_version, "3.10");
        assert_eq!(identity.serial_number, 256);
    }

    #[test]
    fn test_unknown_panel_type_is_dotted() {
        let payload = [0x01, 0x42, 0x07, 0x01, 0x40, 0x92, 0x00, 0x00, 0x00, 0x01];
        let identity = PanelIdentity::decode(&payload).unwrap();
        assert_eq!(identity.panel_type, PanelType::Unknown(0x42));
        assert_eq!(identity.hardware_version, "7.1");
        assert_eq!(identity.software_version, "64.146");
    }

    #[test]
    fn test_concord_out_of_range_revision() {
        assert_eq!(concord_hardware_version(0, 10), "??");
        assert_eq!(concord_hardware_version(26, 9), "Z9");
    }

    #[test]
    fn test_short_payload() {
        assert!(PanelIdentity::decode(&[0x01, 0x14, 0x07]).is_none());
    }
}
