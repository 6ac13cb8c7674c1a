// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoding of device replies.
//!
//! Each reply type has a dedicated decoder. [`Reply::decode`] dispatches on
//! the command id for callers that accept several kinds of answer.

mod info;
mod status;

pub use info::{BatteryStatus, DeviceInfo, IR_MAC_LEN, decode_battery_status, decode_device_info};
pub use status::{
    STATUS_FRAME_LEN, STATUS_PAYLOAD_LEN, StatusRecord, decode_status, encode_status,
};

use crate::error::PacketError;
use crate::protocol::packet::{CMD_ACK, CMD_CUSTOM, CMD_JOIN, CMD_NACK, CMD_STATUS, Header};
use crate::types::MacAddress;

/// Any reply a bridge may send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A status report.
    Status(StatusRecord),
    /// The last command was accepted.
    Ack,
    /// The last command was refused.
    Nack,
    /// Identification from an enumerate.
    DeviceInfo(DeviceInfo),
    /// Signal and battery report.
    Battery(BatteryStatus),
    /// A well-formed packet this client does not interpret.
    Other {
        /// Command id of the packet.
        command: u8,
    },
}

impl Reply {
    /// Decodes any reply.
    ///
    /// # Errors
    ///
    /// Returns a [`PacketError`] if the header is truncated or the payload of
    /// a known reply type is malformed.
    pub fn decode(bytes: &[u8]) -> Result<Self, PacketError> {
        let header = Header::parse(bytes)?;
        Ok(match header.command {
            CMD_STATUS => Self::Status(decode_status(bytes)?),
            CMD_ACK => Self::Ack,
            CMD_NACK => Self::Nack,
            CMD_JOIN => Self::DeviceInfo(decode_device_info(bytes)?),
            CMD_CUSTOM => Self::Battery(decode_battery_status(bytes)?),
            command => Self::Other { command },
        })
    }
}

/// Returns `true` if `bytes` came from `mac` and carries one of `commands`.
///
/// Used to pick the answer to a request out of unrelated traffic.
#[must_use]
pub fn is_reply_from(bytes: &[u8], mac: MacAddress, commands: &[u8]) -> bool {
    Header::parse(bytes).is_ok_and(|h| h.source == mac && commands.contains(&h.command))
}
