// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session state tracking.
//!
//! [`DeviceSessionState`] is the aggregate a session keeps about its device:
//! address, last status, failure count. [`StatusChange`] lists the fields
//! that moved between two status reports.
//!
//! # Examples
//!
//! ```
//! use chrono::Utc;
//! use hpa4911_lib::command::CommandFrame;
//! use hpa4911_lib::response::StatusRecord;
//! use hpa4911_lib::state::{DeviceSessionState, SessionPhase};
//! use hpa4911_lib::types::{DeviceAddress, MacAddress};
//!
//! let mac: MacAddress = "A4:CF:12:00:9B:01".parse().unwrap();
//! let mut state = DeviceSessionState::new(DeviceAddress::new(mac, None, 20910));
//!
//! state.record_failure();
//! state.record_success(StatusRecord::new(CommandFrame::default(), 21), Utc::now());
//!
//! assert_eq!(state.consecutive_failures, 0);
//! assert_eq!(state.phase, SessionPhase::Succeeded);
//! ```

mod session_state;
mod status_change;

pub use session_state::{DeviceSessionState, SessionPhase};
pub use status_change::StatusChange;
