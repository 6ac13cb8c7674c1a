// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Complete and partial HVAC commands.

use crate::protocol::packet::{FLAG_SWING_HORIZONTAL, FLAGS_SWING_OFF};
use crate::response::StatusRecord;
use crate::types::{FanSpeed, HvacMode, PowerState, TargetTemperature};

/// Length of the body of an HVAC set command.
pub const COMMAND_BODY_LEN: usize = 5;

/// The complete desired state sent to the device.
///
/// The device always receives every field; there is no partial write on the
/// wire. Power and mode are kept consistent at construction: powering off
/// forces [`HvacMode::Off`] and [`HvacMode::Off`] forces power off.
///
/// # Examples
///
/// ```
/// use hpa4911_lib::command::CommandFrame;
/// use hpa4911_lib::types::{FanSpeed, HvacMode, PowerState, TargetTemperature};
///
/// let frame = CommandFrame::new(
///     PowerState::Off,
///     HvacMode::Cool,
///     FanSpeed::High,
///     false,
///     TargetTemperature::new(22).unwrap(),
/// );
/// assert_eq!(frame.mode(), HvacMode::Off);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CommandFrame {
    power: PowerState,
    mode: HvacMode,
    fan_speed: FanSpeed,
    swing_horizontal: bool,
    target_temperature: TargetTemperature,
}

impl CommandFrame {
    /// Builds a frame, reconciling power and mode.
    #[must_use]
    pub fn new(
        power: PowerState,
        mode: HvacMode,
        fan_speed: FanSpeed,
        swing_horizontal: bool,
        target_temperature: TargetTemperature,
    ) -> Self {
        let (power, mode) = match (power, mode) {
            (PowerState::Off, _) | (_, HvacMode::Off) => (PowerState::Off, HvacMode::Off),
            (PowerState::On, mode) => (PowerState::On, mode),
        };
        Self {
            power,
            mode,
            fan_speed,
            swing_horizontal,
            target_temperature,
        }
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

    /// Returns whether horizontal swing is enabled.
    #[must_use]
    pub const fn swing_horizontal(&self) -> bool {
        self.swing_horizontal
    }

    /// Returns the set point.
    #[must_use]
    pub const fn target_temperature(&self) -> TargetTemperature {
        self.target_temperature
    }

    /// Returns the flags byte.
    ///
    /// Swing off is sent as [`FLAGS_SWING_OFF`], never as zero.
    #[must_use]
    pub const fn flags(&self) -> u8 {
        if self.swing_horizontal {
            FLAG_SWING_HORIZONTAL
        } else {
            FLAGS_SWING_OFF
        }
    }

    /// Packs the frame into the 5-byte command body:
    /// mode code, fan code, flags, set point ×100 as little-endian i16.
    #[must_use]
    pub fn body(&self) -> [u8; COMMAND_BODY_LEN] {
        let [lo, hi] = self.target_temperature.centi().to_le_bytes();
        [self.mode.code(), self.fan_speed.code(), self.flags(), lo, hi]
    }
}

impl Default for CommandFrame {
    /// Protocol defaults: off, fan auto, no swing, 24 °C.
    fn default() -> Self {
        Self::new(
            PowerState::Off,
            HvacMode::Off,
            FanSpeed::Auto,
            false,
            TargetTemperature::DEFAULT,
        )
    }
}

impl From<&StatusRecord> for CommandFrame {
    fn from(status: &StatusRecord) -> Self {
        Self::new(
            status.power(),
            status.mode(),
            status.fan_speed(),
            status.swing_horizontal(),
            status.target_temperature(),
        )
    }
}

/// A user action: only the fields the user touched are set.
///
/// Merged over the last known state to produce a [`CommandFrame`].
///
/// # Examples
///
/// ```
/// use hpa4911_lib::command::PartialCommand;
/// use hpa4911_lib::types::{FanSpeed, HvacMode};
///
/// let cmd = PartialCommand::new().mode(HvacMode::Heat).fan_speed(FanSpeed::Low);
/// assert!(!cmd.is_empty());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartialCommand {
    /// Requested power state.
    pub power: Option<PowerState>,
    /// Requested mode.
    pub mode: Option<HvacMode>,
    /// Requested fan speed.
    pub fan_speed: Option<FanSpeed>,
    /// Requested horizontal swing.
    pub swing_horizontal: Option<bool>,
    /// Requested set point.
    pub target_temperature: Option<TargetTemperature>,
}

impl PartialCommand {
    /// Creates an empty command.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the power state.
    #[must_use]
    pub fn power(mut self, power: PowerState) -> Self {
        self.power = Some(power);
        self
    }

    /// Sets the mode.
    #[must_use]
    pub fn mode(mut self, mode: HvacMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Sets the fan speed.
    #[must_use]
    pub fn fan_speed(mut self, fan_speed: FanSpeed) -> Self {
        self.fan_speed = Some(fan_speed);
        self
    }

    /// Sets horizontal swing.
    #[must_use]
    pub fn swing_horizontal(mut self, swing: bool) -> Self {
        self.swing_horizontal = Some(swing);
        self
    }

    /// Sets the set point.
    #[must_use]
    pub fn target_temperature(mut self, target: TargetTemperature) -> Self {
        self.target_temperature = Some(target);
        self
    }

    /// Returns `true` if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Builds a complete frame from this command and the last known state.
    ///
    /// Unset fields are carried over from `base`, or from
    /// [`CommandFrame::default`] when nothing is known yet. An explicit
    /// power-off wins over any mode; powering on a unit whose resulting mode
    /// is off resumes `resume_mode`.
    #[must_use]
    pub fn merge_over(&self, base: Option<&StatusRecord>, resume_mode: HvacMode) -> CommandFrame {
        let base = base.map(CommandFrame::from).unwrap_or_default();

        let mut mode = self.mode.unwrap_or(base.mode);
        match self.power {
            Some(PowerState::Off) => mode = HvacMode::Off,
            Some(PowerState::On) if !mode.is_active() => {
                mode = if resume_mode.is_active() {
                    resume_mode
                } else {
                    HvacMode::Cool
                };
            }
            _ => {}
        }
        let power = PowerState::from(mode.is_active());

        CommandFrame::new(
            power,
            mode,
            self.fan_speed.unwrap_or(base.fan_speed),
            self.swing_horizontal.unwrap_or(base.swing_horizontal),
            self.target_temperature.unwrap_or(base.target_temperature),
        )
    }
}
