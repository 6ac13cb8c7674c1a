// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HVAC status reports.
//!
//! A status report is a 29-byte datagram: the header with command 253,
//! followed by this payload:
//!
//! | Offset | Size | Field                               |
//! |--------|------|-------------------------------------|
//! | 0      | 1    | Status type (6 = HVAC)              |
//! | 1      | 1    | Mode code                           |
//! | 2      | 1    | Fan code                            |
//! | 3      | 1    | Flags (0x10 = horizontal swing)     |
//! | 4      | 2    | Measured temperature ×100, i16 LE   |
//! | 6      | 2    | Target temperature ×100, i16 LE     |
//! | 8      | 2    | On-timer minutes, u16 LE            |
//! | 10     | 2    | Off-timer minutes, u16 LE           |

use crate::command::CommandFrame;
use crate::error::PacketError;
use crate::protocol::packet::{
    CMD_STATUS, FLAG_SWING_HORIZONTAL, HEADER_LEN, HVAC_ENDPOINT, Header, STATUS_TYPE_HVAC,
};
use crate::types::{FanSpeed, HvacMode, MacAddress, PowerState, TargetTemperature};

/// Length of the status payload.
pub const STATUS_PAYLOAD_LEN: usize = 12;

/// Length of a complete status datagram.
pub const STATUS_FRAME_LEN: usize = HEADER_LEN + STATUS_PAYLOAD_LEN;

/// A decoded device status report.
///
/// Values are immutable once decoded. The target temperature is always a
/// whole degree in [16, 30] and power is on exactly when the mode is not off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct StatusRecord {
    power: PowerState,
    mode: HvacMode,
    fan_speed: FanSpeed,
    swing_horizontal: bool,
    target_temperature: TargetTemperature,
    current_temperature: i16,
    timer_on_minutes: u16,
    timer_off_minutes: u16,
    sequence: u8,
}

impl StatusRecord {
    /// Builds the record a device would report after applying `frame`.
    #[must_use]
    pub fn new(frame: CommandFrame, current_temperature: i16) -> Self {
        Self {
            power: frame.power(),
            mode: frame.mode(),
            fan_speed: frame.fan_speed(),
            swing_horizontal: frame.swing_horizontal(),
            target_temperature: frame.target_temperature(),
            current_temperature,
            timer_on_minutes: 0,
            timer_off_minutes: 0,
            sequence: 0,
        }
    }

    /// Sets the on/off timers.
    #[must_use]
    pub fn with_timers(mut self, on_minutes: u16, off_minutes: u16) -> Self {
        self.timer_on_minutes = on_minutes;
        self.timer_off_minutes = off_minutes;
        self
    }

    /// Sets the header sequence number.
    #[must_use]
    pub fn with_sequence(mut self, sequence: u8) -> Self {
        self.sequence = sequence;
        self
    }

    /// Returns the power state.
    #[must_use]
    pub const fn power(&self) -> PowerState {
        self.power
    }

    /// Returns the operating mode.
    #[must_use]
    pub const fn mode(&self) -> HvacMode {
        self.mode
    }

    /// Returns the fan speed.
    #[must_use]
    pub const fn fan_speed(&self) -> FanSpeed {
        self.fan_speed
    }

    /// Returns whether horizontal swing is on.
    #[must_use]
    pub const fn swing_horizontal(&self) -> bool {
        self.swing_horizontal
    }

    /// Returns the set point.
    #[must_use]
    pub const fn target_temperature(&self) -> TargetTemperature {
        self.target_temperature
    }

    /// Returns the measured room temperature, rounded to a whole degree.
    #[must_use]
    pub const fn current_temperature(&self) -> i16 {
        self.current_temperature
    }

    /// Returns the on-timer in minutes (0 when unset).
    #[must_use]
    pub const fn timer_on_minutes(&self) -> u16 {
        self.timer_on_minutes
    }

    /// Returns the off-timer in minutes (0 when unset).
    #[must_use]
    pub const fn timer_off_minutes(&self) -> u16 {
        self.timer_off_minutes
    }

    /// Returns the sequence number of the report.
    #[must_use]
    pub const fn sequence(&self) -> u8 {
        self.sequence
    }

    /// Returns the command that would reproduce this state.
    #[must_use]
    pub fn command_frame(&self) -> CommandFrame {
        CommandFrame::from(self)
    }
}

/// Decodes a status report.
///
/// # Errors
///
/// Returns a [`PacketError`] when the datagram is short, is not a status
/// report, carries an unknown mode or fan code, or has a target temperature
/// that is fractional or outside [16, 30].
pub fn decode_status(bytes: &[u8]) -> Result<StatusRecord, PacketError> {
    let header = Header::parse(bytes)?;
    if header.command != CMD_STATUS {
        return Err(PacketError::UnexpectedCommand {
            expected: CMD_STATUS,
            actual: header.command,
        });
    }
    if bytes.len() < STATUS_FRAME_LEN {
        return Err(PacketError::TooShort {
            expected: STATUS_FRAME_LEN,
            actual: bytes.len(),
        });
    }

    let p = &bytes[HEADER_LEN..];
    if p[0] != STATUS_TYPE_HVAC {
        return Err(PacketError::UnexpectedPayloadType(p[0]));
    }
    let mode = HvacMode::from_code(p[1]).ok_or(PacketError::UnknownModeCode(p[1]))?;
    let fan_speed = FanSpeed::from_code(p[2]).ok_or(PacketError::UnknownFanCode(p[2]))?;
    let swing_horizontal = p[3] & FLAG_SWING_HORIZONTAL != 0;
    let measured = i16::from_le_bytes([p[4], p[5]]);
    let desired = i16::from_le_bytes([p[6], p[7]]);
    let target_temperature =
        TargetTemperature::from_centi(desired).ok_or(PacketError::TargetOutOfRange(desired))?;

    Ok(StatusRecord {
        power: PowerState::from(mode.is_active()),
        mode,
        fan_speed,
        swing_horizontal,
        target_temperature,
        current_temperature: round_centi(measured),
        timer_on_minutes: u16::from_le_bytes([p[8], p[9]]),
        timer_off_minutes: u16::from_le_bytes([p[10], p[11]]),
        sequence: header.sequence,
    })
}

/// Encodes a status report as a device would send it.
///
/// The measured temperature is written as whole degrees ×100.
#[must_use]
pub fn encode_status(record: &StatusRecord, source: MacAddress) -> Vec<u8> {
    let header = Header {
        source,
        destination: MacAddress::UNSPECIFIED,
        sequence: record.sequence,
        source_endpoint: HVAC_ENDPOINT,
        destination_endpoint: 0,
        command: CMD_STATUS,
    };
    let frame = record.command_frame();
    let measured = record.current_temperature.saturating_mul(100).to_le_bytes();
    let target = record.target_temperature.centi().to_le_bytes();
    let on = record.timer_on_minutes.to_le_bytes();
    let off = record.timer_off_minutes.to_le_bytes();

    header.with_payload(&[
        STATUS_TYPE_HVAC,
        frame.mode().code(),
        frame.fan_speed().code(),
        frame.flags(),
        measured[0],
        measured[1],
        target[0],
        target[1],
        on[0],
        on[1],
        off[0],
        off[1],
    ])
}

/// Rounds °C ×100 to the nearest whole degree, halves away from zero.
fn round_centi(centi: i16) -> i16 {
    let half = if centi < 0 { -50 } else { 50 };
    // |centi| <= 32768 so the quotient always fits.
    i16::try_from((i32::from(centi) + half) / 100).unwrap_or_default()
}
