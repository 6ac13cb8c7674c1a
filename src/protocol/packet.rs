// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Datagram framing shared by every HPA-4911 packet.
//!
//! Each datagram starts with a fixed 17-byte header:
//!
//! | Offset | Size | Field                |
//! |--------|------|----------------------|
//! | 0      | 1    | Protocol version (0) |
//! | 1      | 6    | Source MAC           |
//! | 7      | 6    | Destination MAC      |
//! | 13     | 1    | Sequence number      |
//! | 14     | 1    | Source endpoint      |
//! | 15     | 1    | Destination endpoint |
//! | 16     | 1    | Command id           |

use std::sync::atomic::{AtomicU8, Ordering};

use crate::error::PacketError;
use crate::types::MacAddress;

/// Length of the packet header.
pub const HEADER_LEN: usize = 17;

/// Protocol version written into every outbound header.
pub const PROTOCOL_VERSION: u8 = 0;

/// Endpoint of the HVAC function on the bridge.
pub const HVAC_ENDPOINT: u8 = 1;

/// Full HVAC state write.
pub const CMD_HVAC_SET: u8 = 97;
/// Positive acknowledgement.
pub const CMD_ACK: u8 = 128;
/// Negative acknowledgement.
pub const CMD_NACK: u8 = 129;
/// Membership commands (enumerate, subscribe).
pub const CMD_JOIN: u8 = 161;
/// Vendor-specific commands (battery status).
pub const CMD_CUSTOM: u8 = 162;
/// Status poll.
pub const CMD_POLL: u8 = 228;
/// Status report.
pub const CMD_STATUS: u8 = 253;

/// JOIN subcommand: reply to an enumerate.
pub const JOIN_ENUMERATE_RESPONSE: u8 = 2;
/// JOIN subcommand: ask every device to identify itself.
pub const JOIN_ENUMERATE_ALL: u8 = 4;

/// CUSTOM subcommand: battery and signal report.
pub const CUSTOM_STATUS_REQUEST: u8 = 92;

/// Status type carried by HVAC status reports.
pub const STATUS_TYPE_HVAC: u8 = 6;

/// Flag bit for horizontal swing.
pub const FLAG_SWING_HORIZONTAL: u8 = 0x10;

/// Flag bit for turbo.
pub const FLAG_TURBO: u8 = 0x08;

/// Flags byte that stops horizontal swing.
///
/// The bridge ignores a cleared flags byte when swing is running; it only
/// stops swing when every bit except swing and turbo is set.
pub const FLAGS_SWING_OFF: u8 = !(FLAG_SWING_HORIZONTAL | FLAG_TURBO);

/// Decoded packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Sender hardware address (all zeros for the client).
    pub source: MacAddress,
    /// Receiver hardware address.
    pub destination: MacAddress,
    /// Rolling sequence number.
    pub sequence: u8,
    /// Sender endpoint.
    pub source_endpoint: u8,
    /// Receiver endpoint.
    pub destination_endpoint: u8,
    /// Command id.
    pub command: u8,
}

impl Header {
    /// Builds a client header: zero source MAC, source endpoint 0.
    #[must_use]
    pub const fn outbound(
        destination: MacAddress,
        destination_endpoint: u8,
        command: u8,
        sequence: u8,
    ) -> Self {
        Self {
            source: MacAddress::UNSPECIFIED,
            destination,
            sequence,
            source_endpoint: 0,
            destination_endpoint,
            command,
        }
    }

    /// Serializes the header.
    #[must_use]
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0] = PROTOCOL_VERSION;
        out[1..7].copy_from_slice(&self.source.octets());
        out[7..13].copy_from_slice(&self.destination.octets());
        out[13] = self.sequence;
        out[14] = self.source_endpoint;
        out[15] = self.destination_endpoint;
        out[16] = self.command;
        out
    }

    /// Parses the header at the start of a datagram.
    ///
    /// # Errors
    ///
    /// Returns `PacketError::TooShort` if fewer than 17 bytes are available.
    pub fn parse(bytes: &[u8]) -> Result<Self, PacketError> {
        if bytes.len() < HEADER_LEN {
            return Err(PacketError::TooShort {
                expected: HEADER_LEN,
                actual: bytes.len(),
            });
        }
        let mac = |range: std::ops::Range<usize>| {
            MacAddress::from_slice(&bytes[range]).unwrap_or(MacAddress::UNSPECIFIED)
        };
        Ok(Self {
            source: mac(1..7),
            destination: mac(7..13),
            sequence: bytes[13],
            source_endpoint: bytes[14],
            destination_endpoint: bytes[15],
            command: bytes[16],
        })
    }

    /// Serializes the header followed by `payload`.
    #[must_use]
    pub fn with_payload(&self, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
        out.extend_from_slice(&self.encode());
        out.extend_from_slice(payload);
        out
    }
}

/// Returns the payload that follows the header.
#[must_use]
pub fn payload(bytes: &[u8]) -> &[u8] {
    bytes.get(HEADER_LEN..).unwrap_or_default()
}

/// Returns the sender MAC of a datagram, if it has a full header.
#[must_use]
pub fn source_mac(bytes: &[u8]) -> Option<MacAddress> {
    Header::parse(bytes).ok().map(|h| h.source)
}

/// Returns the command id of a datagram, if it has a full header.
#[must_use]
pub fn command_id(bytes: &[u8]) -> Option<u8> {
    bytes.get(HEADER_LEN - 1).copied()
}

/// Rolling sequence number source.
///
/// One instance per session; the counter wraps at 256 like the device's own.
#[derive(Debug, Default)]
pub struct SequenceCounter(AtomicU8);

impl SequenceCounter {
    /// Creates a counter starting at 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next sequence number.
    pub fn next(&self) -> u8 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEVICE: MacAddress = MacAddress::new([0xA4, 0xCF, 0x12, 0x00, 0x9B, 0x01]);

    #[test]
    fn header_layout() {
        let header = Header::outbound(DEVICE, HVAC_ENDPOINT, CMD_POLL, 7);
        let bytes = header.encode();
        assert_eq!(bytes[0], 0);
        assert_eq!(&bytes[1..7], &[0; 6]);
        assert_eq!(&bytes[7..13], &DEVICE.octets());
        assert_eq!(bytes[13], 7);
        assert_eq!(bytes[15], 1);
        assert_eq!(bytes[16], 228);
        assert_eq!(Header::parse(&bytes).unwrap(), header);
    }

    #[test]
    fn parse_rejects_short_datagram() {
        assert_eq!(
            Header::parse(&[0; 10]),
            Err(PacketError::TooShort {
                expected: 17,
                actual: 10
            })
        );
    }

    #[test]
    fn sequence_wraps() {
        let counter = SequenceCounter::new();
        for expected in 0..=255u8 {
            assert_eq!(counter.next(), expected);
        }
        assert_eq!(counter.next(), 0);
    }

    #[test]
    fn payload_and_accessors() {
        let header = Header::outbound(DEVICE, 0, CMD_CUSTOM, 3);
        let packet = header.with_payload(&[CUSTOM_STATUS_REQUEST]);
        assert_eq!(payload(&packet), &[92]);
        assert_eq!(command_id(&packet), Some(CMD_CUSTOM));
        assert_eq!(source_mac(&packet), Some(MacAddress::UNSPECIFIED));
        assert_eq!(payload(&[1, 2]), &[] as &[u8]);
        assert_eq!(command_id(&[1, 2]), None);
    }
}
