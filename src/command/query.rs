// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Concrete request types.

use super::{Command, CommandFrame};
use crate::protocol::packet::{
    CMD_CUSTOM, CMD_HVAC_SET, CMD_JOIN, CMD_POLL, CUSTOM_STATUS_REQUEST, HVAC_ENDPOINT,
    JOIN_ENUMERATE_ALL,
};

/// Full HVAC state write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetHvac(pub CommandFrame);

impl Command for SetHvac {
    fn command_id(&self) -> u8 {
        CMD_HVAC_SET
    }

    fn destination_endpoint(&self) -> u8 {
        HVAC_ENDPOINT
    }

    fn payload(&self) -> Vec<u8> {
        self.0.body().to_vec()
    }
}

/// Status poll. The device answers with a status report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusQuery;

impl Command for StatusQuery {
    fn command_id(&self) -> u8 {
        CMD_POLL
    }

    fn destination_endpoint(&self) -> u8 {
        HVAC_ENDPOINT
    }

    fn payload(&self) -> Vec<u8> {
        Vec::new()
    }
}

/// Enumerate request, normally sent to [`MacAddress::BROADCAST`].
///
/// Every bridge replies with its model and firmware identification.
///
/// [`MacAddress::BROADCAST`]: crate::types::MacAddress::BROADCAST
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnumerateQuery;

impl Command for EnumerateQuery {
    fn command_id(&self) -> u8 {
        CMD_JOIN
    }

    fn payload(&self) -> Vec<u8> {
        vec![JOIN_ENUMERATE_ALL]
    }
}

/// Signal and battery report request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatteryQuery;

impl Command for BatteryQuery {
    fn command_id(&self) -> u8 {
        CMD_CUSTOM
    }

    fn payload(&self) -> Vec<u8> {
        vec![CUSTOM_STATUS_REQUEST]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MacAddress;

    #[test]
    fn status_query_targets_hvac_endpoint() {
        let mac = MacAddress::new([1, 2, 3, 4, 5, 6]);
        let bytes = StatusQuery.encode(mac, 4);
        assert_eq!(bytes.len(), 17);
        assert_eq!(bytes[15], 1);
        assert_eq!(bytes[16], 228);
    }

    #[test]
    fn enumerate_is_join_subcommand_four() {
        let bytes = EnumerateQuery.encode(MacAddress::BROADCAST, 0);
        assert_eq!(&bytes[7..13], &[0xFF; 6]);
        assert_eq!(bytes[16], 161);
        assert_eq!(&bytes[17..], &[4]);
    }

    #[test]
    fn battery_query_payload() {
        let bytes = BatteryQuery.encode(MacAddress::new([1, 2, 3, 4, 5, 6]), 1);
        assert_eq!(bytes[16], 162);
        assert_eq!(&bytes[17..], &[92]);
    }
}
