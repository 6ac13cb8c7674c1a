// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Identification and battery replies.

use crate::error::PacketError;
use crate::protocol::packet::{
    CMD_CUSTOM, CMD_JOIN, CUSTOM_STATUS_REQUEST, HEADER_LEN, Header, JOIN_ENUMERATE_RESPONSE,
    payload,
};

/// Minimum payload length of a battery report.
const BATTERY_PAYLOAD_LEN: usize = 8;

/// Offset of the infrared emitter address in a battery report payload.
const IR_MAC_OFFSET: usize = 6;

/// Length of the infrared emitter address.
pub const IR_MAC_LEN: usize = 7;

/// Bridge identification from an enumerate reply.
///
/// The device sends a comma-separated ASCII string:
/// `model,firmware,ble_module,ble_firmware`. Missing trailing fields are
/// left empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct DeviceInfo {
    /// Hardware model.
    pub model: String,
    /// Bridge firmware version.
    pub firmware: String,
    /// Radio module identifier.
    pub ble_module: String,
    /// Radio module firmware version.
    pub ble_firmware: String,
    /// The identification string as received, without padding.
    pub raw: String,
}

impl DeviceInfo {
    /// Parses the comma-separated identification string.
    ///
    /// # Errors
    ///
    /// Returns `PacketError::InvalidPayload` if the model field is empty.
    pub fn parse(text: &str) -> Result<Self, PacketError> {
        let raw = text.trim_end_matches('\0');
        let mut fields = raw.split(',').map(|f| f.trim().to_string());
        let model = fields.next().unwrap_or_default();
        if model.is_empty() {
            return Err(PacketError::InvalidPayload(format!(
                "empty identification string: {text:?}"
            )));
        }
        Ok(Self {
            model,
            firmware: fields.next().unwrap_or_default(),
            ble_module: fields.next().unwrap_or_default(),
            ble_firmware: fields.next().unwrap_or_default(),
            raw: raw.to_string(),
        })
    }

    /// Formats the identification string as the device sends it.
    #[must_use]
    pub fn to_wire_string(&self) -> String {
        format!(
            "{},{},{},{}",
            self.model, self.firmware, self.ble_module, self.ble_firmware
        )
    }
}

/// Decodes an enumerate reply.
///
/// # Errors
///
/// Returns a [`PacketError`] if the datagram is not a JOIN enumerate
/// response or the identification string is unusable.
pub fn decode_device_info(bytes: &[u8]) -> Result<DeviceInfo, PacketError> {
    let header = Header::parse(bytes)?;
    if header.command != CMD_JOIN {
        return Err(PacketError::UnexpectedCommand {
            expected: CMD_JOIN,
            actual: header.command,
        });
    }
    let body = payload(bytes);
    match body.first() {
        Some(&JOIN_ENUMERATE_RESPONSE) => {}
        Some(&other) => return Err(PacketError::UnexpectedPayloadType(other)),
        None => {
            return Err(PacketError::TooShort {
                expected: HEADER_LEN + 1,
                actual: bytes.len(),
            });
        }
    }
    DeviceInfo::parse(&String::from_utf8_lossy(&body[1..]))
}

/// Radio signal and battery report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct BatteryStatus {
    /// Received signal strength as reported by the bridge (raw byte).
    pub rssi: u8,
    /// Battery level as reported by the bridge.
    pub battery_level: u16,
    /// Address of the paired infrared emitter, when the report carries it.
    pub ir_mac: Option<[u8; IR_MAC_LEN]>,
}

impl BatteryStatus {
    /// Formats the infrared emitter address as upper-case colon-separated hex.
    #[must_use]
    pub fn ir_mac_string(&self) -> Option<String> {
        self.ir_mac.map(|octets| {
            octets
                .iter()
                .map(|b| format!("{b:02X}"))
                .collect::<Vec<_>>()
                .join(":")
        })
    }
}

/// Decodes a battery report.
///
/// # Errors
///
/// Returns a [`PacketError`] if the datagram is not a CUSTOM battery reply
/// or its payload is shorter than 8 bytes.
pub fn decode_battery_status(bytes: &[u8]) -> Result<BatteryStatus, PacketError> {
    let header = Header::parse(bytes)?;
    if header.command != CMD_CUSTOM {
        return Err(PacketError::UnexpectedCommand {
            expected: CMD_CUSTOM,
            actual: header.command,
        });
    }
    let body = payload(bytes);
    if body.len() < BATTERY_PAYLOAD_LEN {
        return Err(PacketError::TooShort {
            expected: HEADER_LEN + BATTERY_PAYLOAD_LEN,
            actual: bytes.len(),
        });
    }
    if body[0] != CUSTOM_STATUS_REQUEST {
        return Err(PacketError::UnexpectedPayloadType(body[0]));
    }
    let ir_mac = body
        .get(IR_MAC_OFFSET..IR_MAC_OFFSET + IR_MAC_LEN)
        .and_then(|octets| octets.try_into().ok());
    Ok(BatteryStatus {
        rssi: body[1],
        battery_level: u16::from_le_bytes([body[2], body[3]]),
        ir_mac,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MacAddress;

    fn reply(command: u8, body: &[u8]) -> Vec<u8> {
        Header {
            source: MacAddress::new([1, 2, 3, 4, 5, 6]),
            destination: MacAddress::UNSPECIFIED,
            sequence: 0,
            source_endpoint: 0,
            destination_endpoint: 0,
            command,
        }
        .with_payload(body)
    }

    #[test]
    fn parses_full_identification() {
        let mut body = vec![JOIN_ENUMERATE_RESPONSE];
        body.extend_from_slice(b"HPA-4911,1.4.2,NRF52,0.9\0");
        let info = decode_device_info(&reply(CMD_JOIN, &body)).unwrap();
        assert_eq!(info.model, "HPA-4911");
        assert_eq!(info.firmware, "1.4.2");
        assert_eq!(info.ble_module, "NRF52");
        assert_eq!(info.ble_firmware, "0.9");
        assert_eq!(info.raw, "HPA-4911,1.4.2,NRF52,0.9");
        assert_eq!(info.to_wire_string(), info.raw);
    }

    #[test]
    fn missing_fields_are_empty() {
        let info = DeviceInfo::parse("HPA-4911").unwrap();
        assert_eq!(info.firmware, "");
        assert_eq!(info.ble_firmware, "");
    }

    #[test]
    fn rejects_empty_identification() {
        assert!(matches!(
            decode_device_info(&reply(CMD_JOIN, &[JOIN_ENUMERATE_RESPONSE])),
            Err(PacketError::InvalidPayload(_))
        ));
        assert_eq!(
            decode_device_info(&reply(CMD_JOIN, &[4])),
            Err(PacketError::UnexpectedPayloadType(4))
        );
    }

    #[test]
    fn parses_battery_report() {
        let bytes = reply(CMD_CUSTOM, &[92, 0xC8, 0x2C, 0x01, 0, 0, 0, 0]);
        let status = decode_battery_status(&bytes).unwrap();
        assert_eq!(status.rssi, 0xC8);
        assert_eq!(status.battery_level, 300);
        assert_eq!(status.ir_mac, None);
        assert_eq!(status.ir_mac_string(), None);
    }

    #[test]
    fn battery_report_with_ir_address() {
        let bytes = reply(
            CMD_CUSTOM,
            &[92, 0xC8, 0x2C, 0x01, 0, 0, 0xA4, 0xCF, 0x12, 0x00, 0x9B, 0x01, 0x7E],
        );
        let status = decode_battery_status(&bytes).unwrap();
        assert_eq!(status.battery_level, 300);
        assert_eq!(status.ir_mac, Some([0xA4, 0xCF, 0x12, 0x00, 0x9B, 0x01, 0x7E]));
        assert_eq!(status.ir_mac_string().as_deref(), Some("A4:CF:12:00:9B:01:7E"));
    }

    #[test]
    fn short_battery_report() {
        let bytes = reply(CMD_CUSTOM, &[92, 1, 2]);
        assert_eq!(
            decode_battery_status(&bytes),
            Err(PacketError::TooShort {
                expected: 25,
                actual: 20
            })
        );
    }
}
