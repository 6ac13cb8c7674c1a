// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for HPA-4911 device control.
//!
//! Each type ensures values are within their valid ranges at construction
//! time, so a command built from them is always encodable.
//!
//! # Types
//!
//! - [`MacAddress`] - Durable device identity
//! - [`DeviceAddress`] - MAC plus cached IP and port
//! - [`PowerState`] - On/Off
//! - [`HvacMode`] - Off/Cool/Heat/Dry/FanOnly/Auto
//! - [`FanSpeed`] - Low/Medium/High/Auto
//! - [`TargetTemperature`] - Set point in whole degrees (16-30 °C)

mod address;
mod mac;
mod mode;
mod power;
mod temperature;

pub use address::DeviceAddress;
pub use mac::MacAddress;
pub use mode::{FanSpeed, HvacMode};
pub use power::PowerState;
pub use temperature::TargetTemperature;
