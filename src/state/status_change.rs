// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Field-level differences between two status reports.
//!
//! Status records are replaced wholesale; [`StatusChange::diff`] tells
//! subscribers which fields actually moved.
//!
//! # Examples
//!
//! ```
//! use hpa4911_lib::command::CommandFrame;
//! use hpa4911_lib::response::StatusRecord;
//! use hpa4911_lib::state::StatusChange;
//!
//! let before = StatusRecord::new(CommandFrame::default(), 21);
//! let after = StatusRecord::new(CommandFrame::default(), 22);
//!
//! assert_eq!(
//!     StatusChange::diff(Some(&before), &after),
//!     vec![StatusChange::CurrentTemperature(22)]
//! );
//! ```

use crate::response::StatusRecord;
use crate::types::{FanSpeed, HvacMode, PowerState, TargetTemperature};

/// One field of a status report that changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum StatusChange {
    /// Power state changed.
    Power(PowerState),
    /// Operating mode changed.
    Mode(HvacMode),
    /// Fan speed changed.
    FanSpeed(FanSpeed),
    /// Horizontal swing toggled.
    SwingHorizontal(bool),
    /// Set point changed.
    TargetTemperature(TargetTemperature),
    /// Measured temperature changed.
    CurrentTemperature(i16),
    /// On or off timer changed.
    Timers {
        /// On-timer minutes.
        on_minutes: u16,
        /// Off-timer minutes.
        off_minutes: u16,
    },
}

impl StatusChange {
    /// Lists the fields of `new` that differ from `old`.
    ///
    /// Every field is reported when there is no previous record.
    #[must_use]
    pub fn diff(old: Option<&StatusRecord>, new: &StatusRecord) -> Vec<Self> {
        let after = Self::fields(new);
        match old {
            None => after.to_vec(),
            Some(old) => Self::fields(old)
                .into_iter()
                .zip(after)
                .filter(|(before, after)| before != after)
                .map(|(_, after)| after)
                .collect(),
        }
    }

    /// Every reportable field of `status`, in a fixed order.
    fn fields(status: &StatusRecord) -> [Self; 7] {
        [
            Self::Power(status.power()),
            Self::Mode(status.mode()),
            Self::FanSpeed(status.fan_speed()),
            Self::SwingHorizontal(status.swing_horizontal()),
            Self::TargetTemperature(status.target_temperature()),
            Self::CurrentTemperature(status.current_temperature()),
            Self::Timers {
                on_minutes: status.timer_on_minutes(),
                off_minutes: status.timer_off_minutes(),
            },
        ]
    }
}
