// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Climate-entity view of a device session.
//!
//! Home-automation hosts speak in string modes and floating temperatures.
//! [`ClimateEntity`] translates that vocabulary to [`PartialCommand`]s and
//! back, validating every value before the session is touched. It keeps no
//! protocol state of its own.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use hpa4911_lib::DeviceSession;
//! use hpa4911_lib::climate::ClimateEntity;
//!
//! # async fn example() -> hpa4911_lib::Result<()> {
//! let session = DeviceSession::builder("A4:CF:12:00:9B:01".parse()?)
//!     .build_udp()
//!     .await?;
//! let climate = ClimateEntity::new(Arc::new(session));
//!
//! climate.set_hvac_mode("heat").await?;
//! climate.set_temperature(22.0).await?;
//!
//! let state = climate.state();
//! println!("{:?} -> {:?}", state.hvac_action, state.hvac_mode);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use crate::command::PartialCommand;
use crate::error::{Result, ValueError};
use crate::protocol::Transport;
use crate::response::StatusRecord;
use crate::session::DeviceSession;
use crate::types::{FanSpeed, HvacMode, PowerState, TargetTemperature};

/// Supported HVAC modes, in host order.
pub const HVAC_MODES: [&str; 6] = ["off", "cool", "heat", "dry", "fan_only", "auto"];

/// Supported fan modes.
pub const FAN_MODES: [&str; 4] = ["low", "medium", "high", "auto"];

/// Supported swing modes.
pub const SWING_MODES: [&str; 2] = ["off", "on"];

/// Temperature unit reported to the host.
pub const TEMPERATURE_UNIT: &str = "°C";

/// Set-point granularity in degrees.
pub const TARGET_TEMPERATURE_STEP: f64 = 1.0;

/// What the unit is doing, derived from mode and temperatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HvacAction {
    /// Unit is off.
    Off,
    /// Cooling.
    Cooling,
    /// Heating.
    Heating,
    /// Dehumidifying.
    Drying,
    /// Fan only.
    Fan,
}

impl HvacAction {
    /// Derives the action for a status record.
    ///
    /// In auto mode the unit is assumed to heat while the room is below the
    /// set point and to cool otherwise.
    #[must_use]
    pub fn from_status(status: &StatusRecord) -> Self {
        match status.mode() {
            HvacMode::Off => Self::Off,
            HvacMode::Cool => Self::Cooling,
            HvacMode::Heat => Self::Heating,
            HvacMode::Dry => Self::Drying,
            HvacMode::FanOnly => Self::Fan,
            HvacMode::Auto => {
                if i16::from(status.target_temperature().celsius()) > status.current_temperature() {
                    Self::Heating
                } else {
                    Self::Cooling
                }
            }
        }
    }

    /// Returns the host-facing name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Cooling => "cooling",
            Self::Heating => "heating",
            Self::Drying => "drying",
            Self::Fan => "fan",
        }
    }
}

impl fmt::Display for HvacAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host-facing snapshot of the unit.
///
/// Everything except `available` is `None` until the first status arrives.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ClimateState {
    /// One of [`HVAC_MODES`].
    pub hvac_mode: Option<&'static str>,
    /// Current action.
    pub hvac_action: Option<HvacAction>,
    /// One of [`FAN_MODES`].
    pub fan_mode: Option<&'static str>,
    /// One of [`SWING_MODES`].
    pub swing_mode: Option<&'static str>,
    /// Measured room temperature in whole degrees.
    pub current_temperature: Option<f64>,
    /// Set point in whole degrees.
    pub target_temperature: Option<f64>,
    /// Whether the session still considers the unit reachable.
    pub available: bool,
}

impl ClimateState {
    fn from_status(status: Option<&StatusRecord>, available: bool) -> Self {
        Self {
            hvac_mode: status.map(|s| s.mode().as_str()),
            hvac_action: status.map(HvacAction::from_status),
            fan_mode: status.map(|s| s.fan_speed().as_str()),
            swing_mode: status.map(|s| swing_name(s.swing_horizontal())),
            current_temperature: status.map(|s| f64::from(s.current_temperature())),
            target_temperature: status.map(|s| f64::from(s.target_temperature().celsius())),
            available,
        }
    }
}

const fn swing_name(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

fn parse_swing(value: &str) -> std::result::Result<bool, ValueError> {
    match value {
        "on" => Ok(true),
        "off" => Ok(false),
        other => Err(ValueError::InvalidSwingMode(other.to_string())),
    }
}

/// Climate entity backed by a [`DeviceSession`].
#[derive(Debug)]
pub struct ClimateEntity<T: Transport> {
    session: Arc<DeviceSession<T>>,
}

impl<T: Transport> Clone for ClimateEntity<T> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
        }
    }
}

impl<T: Transport> ClimateEntity<T> {
    /// Wraps a session.
    #[must_use]
    pub fn new(session: Arc<DeviceSession<T>>) -> Self {
        Self { session }
    }

    /// Returns the underlying session.
    #[must_use]
    pub fn session(&self) -> &Arc<DeviceSession<T>> {
        &self.session
    }

    /// Stable identifier for the host: the compact MAC.
    #[must_use]
    pub fn unique_id(&self) -> String {
        self.session.mac().compact()
    }

    /// Name shown by the host.
    #[must_use]
    pub fn name(&self) -> String {
        self.session
            .friendly_name()
            .map_or_else(|| self.session.mac().to_string(), str::to_string)
    }

    /// Supported HVAC modes.
    #[must_use]
    pub fn hvac_modes(&self) -> &'static [&'static str] {
        &HVAC_MODES
    }

    /// Supported fan modes.
    #[must_use]
    pub fn fan_modes(&self) -> &'static [&'static str] {
        &FAN_MODES
    }

    /// Supported swing modes.
    #[must_use]
    pub fn swing_modes(&self) -> &'static [&'static str] {
        &SWING_MODES
    }

    /// Lowest accepted set point.
    #[must_use]
    pub fn min_temp(&self) -> f64 {
        f64::from(TargetTemperature::MIN)
    }

    /// Highest accepted set point.
    #[must_use]
    pub fn max_temp(&self) -> f64 {
        f64::from(TargetTemperature::MAX)
    }

    /// Set-point step.
    #[must_use]
    pub fn target_temperature_step(&self) -> f64 {
        TARGET_TEMPERATURE_STEP
    }

    /// Temperature unit.
    #[must_use]
    pub fn temperature_unit(&self) -> &'static str {
        TEMPERATURE_UNIT
    }

    /// Returns the current snapshot from the session cache.
    #[must_use]
    pub fn state(&self) -> ClimateState {
        let state = self.session.state();
        let available = state.is_available(self.session.options().poll.failure_threshold);
        ClimateState::from_status(state.last_status.as_ref(), available)
    }

    /// Sets the HVAC mode; `"off"` powers the unit down.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for an unknown mode, otherwise any error
    /// of [`DeviceSession::apply`].
    pub async fn set_hvac_mode(&self, mode: &str) -> Result<ClimateState> {
        let mode: HvacMode = mode.parse()?;
        self.apply(PartialCommand::new().mode(mode)).await
    }

    /// Sets the fan mode.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for an unknown fan mode, otherwise any
    /// error of [`DeviceSession::apply`].
    pub async fn set_fan_mode(&self, fan_mode: &str) -> Result<ClimateState> {
        let fan: FanSpeed = fan_mode.parse()?;
        self.apply(PartialCommand::new().fan_speed(fan)).await
    }

    /// Sets horizontal swing (`"on"` or `"off"`).
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for any other value, otherwise any error
    /// of [`DeviceSession::apply`].
    pub async fn set_swing_mode(&self, swing_mode: &str) -> Result<ClimateState> {
        let swing = parse_swing(swing_mode)?;
        self.apply(PartialCommand::new().swing_horizontal(swing)).await
    }

    /// Sets the target temperature.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` unless `celsius` is a whole number in
    /// [16, 30], otherwise any error of [`DeviceSession::apply`].
    pub async fn set_temperature(&self, celsius: f64) -> Result<ClimateState> {
        let target = TargetTemperature::from_celsius_f64(celsius)?;
        self.apply(PartialCommand::new().target_temperature(target))
            .await
    }

    /// Powers the unit on in its last active mode.
    ///
    /// # Errors
    ///
    /// Any error of [`DeviceSession::apply`].
    pub async fn turn_on(&self) -> Result<ClimateState> {
        self.apply(PartialCommand::new().power(PowerState::On)).await
    }

    /// Powers the unit off.
    ///
    /// # Errors
    ///
    /// Any error of [`DeviceSession::apply`].
    pub async fn turn_off(&self) -> Result<ClimateState> {
        self.apply(PartialCommand::new().power(PowerState::Off)).await
    }

    /// Refreshes from the device.
    ///
    /// # Errors
    ///
    /// Any error of [`DeviceSession::refresh`].
    pub async fn update(&self) -> Result<ClimateState> {
        self.session.refresh().await?;
        Ok(self.state())
    }

    async fn apply(&self, command: PartialCommand) -> Result<ClimateState> {
        self.session.apply(command).await?;
        Ok(self.state())
    }
}
