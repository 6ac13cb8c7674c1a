// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Codec invariants checked across the whole value domain.

mod common;

use common::*;
use hpa4911_lib::PacketError;
use hpa4911_lib::command::CommandFrame;
use hpa4911_lib::protocol::packet::HEADER_LEN;
use hpa4911_lib::response::{STATUS_FRAME_LEN, StatusRecord, decode_status};
use hpa4911_lib::types::{FanSpeed, HvacMode, PowerState, TargetTemperature};

#[test]
fn every_constructible_frame_survives_the_wire() {
    for power in [PowerState::On, PowerState::Off] {
        for mode in HvacMode::ALL {
            for fan in FanSpeed::ALL {
                for swing in [false, true] {
                    for celsius in TargetTemperature::MIN..=TargetTemperature::MAX {
                        let target = TargetTemperature::new(celsius).unwrap();
                        let frame = CommandFrame::new(power, mode, fan, swing, target);
                        let bytes = status_bytes(DEVICE_MAC, &StatusRecord::new(frame, 21));

                        let decoded = decode_status(&bytes).unwrap();
                        assert_eq!(decoded.command_frame(), frame, "{frame:?}");
                        assert_eq!(decoded.power().is_on(), decoded.mode().is_active());
                    }
                }
            }
        }
    }
}

#[test]
fn decoded_targets_are_whole_degrees_in_range() {
    let template = cooling_status();
    for centi in (-500i16..=4000).step_by(25) {
        let mut bytes = template.clone();
        bytes[HEADER_LEN + 6..HEADER_LEN + 8].copy_from_slice(&centi.to_le_bytes());

        let valid = centi % 100 == 0 && (1600..=3000).contains(&centi);
        match decode_status(&bytes) {
            Ok(status) => {
                assert!(valid, "accepted {centi}");
                assert_eq!(status.target_temperature().centi(), centi);
            }
            Err(e) => {
                assert!(!valid, "rejected {centi}");
                assert_eq!(e, PacketError::TargetOutOfRange(centi));
            }
        }
    }
}

#[test]
fn truncated_status_frames_are_rejected() {
    let bytes = cooling_status();
    assert_eq!(bytes.len(), STATUS_FRAME_LEN);
    for len in 0..STATUS_FRAME_LEN {
        assert!(decode_status(&bytes[..len]).is_err(), "length {len}");
    }
}
