// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Target temperature type.
//!
//! The device quantizes set points to whole degrees Celsius between 16 and
//! 30. Values are validated at construction so that a [`CommandFrame`]
//! (crate::command::CommandFrame) can never carry an unsendable set point.

use std::fmt;

use crate::error::ValueError;

/// Target temperature in whole degrees Celsius (16-30).
///
/// # Examples
///
/// ```
/// use hpa4911_lib::types::TargetTemperature;
///
/// let t = TargetTemperature::new(24).unwrap();
/// assert_eq!(t.celsius(), 24);
///
/// assert!(TargetTemperature::new(31).is_err());
/// assert!(TargetTemperature::from_celsius_f64(22.5).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct TargetTemperature(u8);

impl TargetTemperature {
    /// Lowest set point the device accepts.
    pub const MIN: u8 = 16;

    /// Highest set point the device accepts.
    pub const MAX: u8 = 30;

    /// Set point used when nothing is known about the device.
    pub const DEFAULT: Self = Self(24);

    /// Creates a target temperature.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if value is outside [16, 30].
    pub fn new(celsius: u8) -> Result<Self, ValueError> {
        if !(Self::MIN..=Self::MAX).contains(&celsius) {
            return Err(ValueError::OutOfRange {
                min: i32::from(Self::MIN),
                max: i32::from(Self::MAX),
                actual: i32::from(celsius),
            });
        }
        Ok(Self(celsius))
    }

    /// Creates a target temperature from a host-supplied floating value.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::FractionalTemperature` for values that are not a
    /// whole degree, and `ValueError::OutOfRange` outside [16, 30].
    pub fn from_celsius_f64(celsius: f64) -> Result<Self, ValueError> {
        if !celsius.is_finite() || celsius.fract() != 0.0 {
            return Err(ValueError::FractionalTemperature(celsius));
        }
        if celsius < f64::from(Self::MIN) || celsius > f64::from(Self::MAX) {
            // Saturating cast is fine here: the value is only reported back.
            #[allow(clippy::cast_possible_truncation)]
            let actual = celsius as i32;
            return Err(ValueError::OutOfRange {
                min: i32::from(Self::MIN),
                max: i32::from(Self::MAX),
                actual,
            });
        }
        // In range and integral, checked above.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let whole = celsius as u8;
        Ok(Self(whole))
    }

    /// Creates a target temperature from the wire encoding (°C × 100).
    ///
    /// Returns `None` for fractional or out-of-range values.
    #[must_use]
    pub fn from_centi(centi: i16) -> Option<Self> {
        if centi % 100 != 0 {
            return None;
        }
        let whole = u8::try_from(centi / 100).ok()?;
        Self::new(whole).ok()
    }

    /// Returns the value in degrees Celsius.
    #[must_use]
    pub const fn celsius(&self) -> u8 {
        self.0
    }

    /// Returns the wire encoding (°C × 100).
    #[must_use]
    pub fn centi(&self) -> i16 {
        i16::from(self.0) * 100
    }
}

impl Default for TargetTemperature {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for TargetTemperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\u{00b0}C", self.0)
    }
}

impl TryFrom<u8> for TargetTemperature {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TargetTemperature> for u8 {
    fn from(value: TargetTemperature) -> Self {
        value.0
    }
}
