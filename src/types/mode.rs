// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Operating mode and fan speed enumerations.
//!
//! Each enum knows its wire code and its host-facing name. Unknown codes are
//! rejected rather than coerced: the protocol defines no extension codes.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// HVAC operating mode.
///
/// # Examples
///
/// ```
/// use hpa4911_lib::types::HvacMode;
///
/// assert_eq!(HvacMode::from_code(254), Some(HvacMode::Auto));
/// assert_eq!(HvacMode::Heat.code(), 2);
/// assert_eq!("fan_only".parse::<HvacMode>().unwrap(), HvacMode::FanOnly);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HvacMode {
    /// Unit off.
    #[default]
    Off,
    /// Cooling.
    Cool,
    /// Heating.
    Heat,
    /// Dehumidifying.
    Dry,
    /// Ventilation only.
    FanOnly,
    /// Device-chosen heating or cooling.
    Auto,
}

impl HvacMode {
    /// All modes in host display order.
    pub const ALL: [Self; 6] = [
        Self::Off,
        Self::Cool,
        Self::Heat,
        Self::Dry,
        Self::FanOnly,
        Self::Auto,
    ];

    /// Returns the wire code.
    #[must_use]
    pub const fn code(&self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Cool => 1,
            Self::Heat => 2,
            Self::Dry => 3,
            Self::FanOnly => 4,
            Self::Auto => 254,
        }
    }

    /// Looks up a mode by wire code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Off),
            1 => Some(Self::Cool),
            2 => Some(Self::Heat),
            3 => Some(Self::Dry),
            4 => Some(Self::FanOnly),
            254 => Some(Self::Auto),
            _ => None,
        }
    }

    /// Returns the host-facing name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Cool => "cool",
            Self::Heat => "heat",
            Self::Dry => "dry",
            Self::FanOnly => "fan_only",
            Self::Auto => "auto",
        }
    }

    /// Returns `true` for every mode except [`HvacMode::Off`].
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::Off)
    }
}

impl fmt::Display for HvacMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a host mode name such as `"fan_only"`.
///
/// Matching is exact: names are lower-case and surrounding whitespace is not
/// trimmed, so `"Heat"` and `" cool"` are rejected. Normalise host input first.
impl FromStr for HvacMode {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ValueError::InvalidHvacMode(s.to_string()))
    }
}

/// Fan speed.
///
/// # Examples
///
/// ```
/// use hpa4911_lib::types::FanSpeed;
///
/// assert_eq!(FanSpeed::from_code(3), Some(FanSpeed::High));
/// assert_eq!(FanSpeed::from_code(7), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FanSpeed {
    /// Low speed.
    Low,
    /// Medium speed.
    Medium,
    /// High speed.
    High,
    /// Device-chosen speed.
    #[default]
    Auto,
}

impl FanSpeed {
    /// All speeds in host display order.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Auto];

    /// Returns the wire code.
    #[must_use]
    pub const fn code(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Auto => 254,
        }
    }

    /// Looks up a speed by wire code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Low),
            2 => Some(Self::Medium),
            3 => Some(Self::High),
            254 => Some(Self::Auto),
            _ => None,
        }
    }

    /// Returns the host-facing name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for FanSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a host fan name such as `"medium"`.
///
/// Matching is exact, as for [`HvacMode`].
impl FromStr for FanSpeed {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ValueError::InvalidFanMode(s.to_string()))
    }
}
