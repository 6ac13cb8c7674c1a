// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outbound packet definitions.
//!
//! Every request the client can send is a [`Command`]: a command id, a
//! destination endpoint and a payload. Encoding prepends the 17-byte header
//! described in [`crate::protocol::packet`].
//!
//! # Available Commands
//!
//! | Command | Id | Purpose |
//! |---------|----|---------|
//! | [`SetHvac`] | 97 | Write the complete HVAC state |
//! | [`StatusQuery`] | 228 | Ask for a status report |
//! | [`EnumerateQuery`] | 161 | Ask every bridge on the segment to identify itself |
//! | [`BatteryQuery`] | 162 | Ask for signal strength and battery level |
//!
//! # Examples
//!
//! ```
//! use hpa4911_lib::command::{encode_command, CommandFrame, PartialCommand};
//! use hpa4911_lib::types::{HvacMode, MacAddress};
//!
//! let frame = PartialCommand::new()
//!     .mode(HvacMode::Cool)
//!     .merge_over(None, HvacMode::Cool);
//! let mac: MacAddress = "A4:CF:12:00:9B:01".parse().unwrap();
//! let bytes = encode_command(&frame, mac, 0);
//!
//! assert_eq!(bytes.len(), 22);
//! assert_eq!(bytes[16], 97);
//! ```

mod frame;
mod query;

pub use frame::{COMMAND_BODY_LEN, CommandFrame, PartialCommand};
pub use query::{BatteryQuery, EnumerateQuery, SetHvac, StatusQuery};

use crate::protocol::packet::Header;
use crate::types::MacAddress;

/// A request that can be sent to a bridge.
pub trait Command {
    /// Returns the command id written into the header.
    fn command_id(&self) -> u8;

    /// Returns the endpoint the command is addressed to.
    fn destination_endpoint(&self) -> u8 {
        0
    }

    /// Returns the bytes following the header.
    fn payload(&self) -> Vec<u8>;

    /// Serializes the full datagram.
    fn encode(&self, destination: MacAddress, sequence: u8) -> Vec<u8> {
        Header::outbound(
            destination,
            self.destination_endpoint(),
            self.command_id(),
            sequence,
        )
        .with_payload(&self.payload())
    }
}

/// Encodes a complete HVAC state write for `destination`.
///
/// Pure: the same frame, destination and sequence always yield the same bytes.
#[must_use]
pub fn encode_command(frame: &CommandFrame, destination: MacAddress, sequence: u8) -> Vec<u8> {
    SetHvac(*frame).encode(destination, sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FanSpeed, HvacMode, PowerState, TargetTemperature};

    const DEVICE: MacAddress = MacAddress::new([0xA4, 0xCF, 0x12, 0x00, 0x9B, 0x01]);

    #[test]
    fn encode_is_deterministic() {
        let frame = CommandFrame::new(
            PowerState::On,
            HvacMode::Dry,
            FanSpeed::Medium,
            false,
            TargetTemperature::new(27).unwrap(),
        );
        assert_eq!(
            encode_command(&frame, DEVICE, 42),
            encode_command(&frame, DEVICE, 42)
        );
    }

    #[test]
    fn set_command_layout() {
        let frame = CommandFrame::new(
            PowerState::On,
            HvacMode::Cool,
            FanSpeed::Low,
            true,
            TargetTemperature::new(18).unwrap(),
        );
        let bytes = encode_command(&frame, DEVICE, 9);

        assert_eq!(&bytes[7..13], &DEVICE.octets());
        assert_eq!(bytes[13], 9);
        assert_eq!(bytes[15], 1);
        assert_eq!(bytes[16], 97);
        // 1800 = 0x0708
        assert_eq!(&bytes[17..], &[1, 1, 0x10, 0x08, 0x07]);
    }
}
