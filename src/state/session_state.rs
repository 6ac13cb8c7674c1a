// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mutable aggregate owned by a device session.

use std::fmt;

use chrono::{DateTime, Utc};

use super::StatusChange;
use crate::response::StatusRecord;
use crate::types::{DeviceAddress, HvacMode};

/// Where a session is in its request cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// No operation in flight.
    #[default]
    Idle,
    /// Looking up the device address.
    Resolving,
    /// Waiting for a reply.
    Exchanging,
    /// The last operation produced a status.
    Succeeded,
    /// The last operation failed.
    Failed,
}

impl SessionPhase {
    /// Returns `true` while an operation holds the session.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Resolving | Self::Exchanging)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Resolving => "resolving",
            Self::Exchanging => "exchanging",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Snapshot of everything a session knows about its device.
///
/// Readers always get a complete copy: `last_status` is either a fully
/// decoded record or `None`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DeviceSessionState {
    /// Current address; the IP is replaced whenever resolution finds a new one.
    #[serde(serialize_with = "serialize_address")]
    pub address: DeviceAddress,
    /// Most recent decoded status.
    pub last_status: Option<StatusRecord>,
    /// When the last successful exchange completed.
    pub last_success_time: Option<DateTime<Utc>>,
    /// Failed operations since the last success.
    pub consecutive_failures: u32,
    /// Mode restored by a bare power-on.
    pub resume_mode: HvacMode,
    /// Request cycle phase.
    pub phase: SessionPhase,
}

impl DeviceSessionState {
    /// Creates the state of a session that has not talked to its device yet.
    #[must_use]
    pub fn new(address: DeviceAddress) -> Self {
        Self {
            address,
            last_status: None,
            last_success_time: None,
            consecutive_failures: 0,
            resume_mode: HvacMode::Cool,
            phase: SessionPhase::Idle,
        }
    }

    /// Stores a fresh status and returns what changed.
    ///
    /// Resets the failure counter and remembers the mode for power-on.
    pub fn record_success(&mut self, status: StatusRecord, at: DateTime<Utc>) -> Vec<StatusChange> {
        let changes = StatusChange::diff(self.last_status.as_ref(), &status);
        if status.mode().is_active() {
            self.resume_mode = status.mode();
        }
        self.last_status = Some(status);
        self.last_success_time = Some(at);
        self.consecutive_failures = 0;
        self.phase = SessionPhase::Succeeded;
        changes
    }

    /// Counts a failed operation and returns the new failure count.
    pub fn record_failure(&mut self) -> u32 {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.phase = SessionPhase::Failed;
        self.consecutive_failures
    }

    /// Returns `true` while fewer than `threshold` operations failed in a row.
    #[must_use]
    pub fn is_available(&self, threshold: u32) -> bool {
        self.consecutive_failures < threshold
    }
}

fn serialize_address<S: serde::Serializer>(
    address: &DeviceAddress,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandFrame;
    use crate::types::{FanSpeed, MacAddress, PowerState, TargetTemperature};

    fn address() -> DeviceAddress {
        DeviceAddress::new(MacAddress::new([1, 2, 3, 4, 5, 6]), None, 20910)
    }

    fn status(mode: HvacMode) -> StatusRecord {
        StatusRecord::new(
            CommandFrame::new(
                PowerState::On,
                mode,
                FanSpeed::Auto,
                false,
                TargetTemperature::DEFAULT,
            ),
            22,
        )
    }

    #[test]
    fn new_state_is_available_and_idle() {
        let state = DeviceSessionState::new(address());
        assert!(state.is_available(3));
        assert_eq!(state.phase, SessionPhase::Idle);
        assert_eq!(state.resume_mode, HvacMode::Cool);
    }

    #[test]
    fn failures_accumulate_until_success() {
        let mut state = DeviceSessionState::new(address());
        assert_eq!(state.record_failure(), 1);
        assert_eq!(state.record_failure(), 2);
        assert!(state.is_available(3));
        assert_eq!(state.record_failure(), 3);
        assert!(!state.is_available(3));
        assert_eq!(state.phase, SessionPhase::Failed);

        state.record_success(status(HvacMode::Heat), Utc::now());
        assert_eq!(state.consecutive_failures, 0);
        assert!(state.is_available(3));
        assert!(state.last_success_time.is_some());
    }

    #[test]
    fn success_tracks_resume_mode() {
        let mut state = DeviceSessionState::new(address());
        state.record_success(status(HvacMode::Dry), Utc::now());
        assert_eq!(state.resume_mode, HvacMode::Dry);

        let off = StatusRecord::new(CommandFrame::default(), 22);
        state.record_success(off, Utc::now());
        assert_eq!(state.resume_mode, HvacMode::Dry);
    }

    #[test]
    fn success_reports_changes() {
        let mut state = DeviceSessionState::new(address());
        assert_eq!(
            state.record_success(status(HvacMode::Cool), Utc::now()).len(),
            7
        );
        assert!(
            state
                .record_success(status(HvacMode::Cool), Utc::now())
                .is_empty()
        );
    }

    #[test]
    fn phase_busy() {
        assert!(SessionPhase::Resolving.is_busy());
        assert!(SessionPhase::Exchanging.is_busy());
        assert!(!SessionPhase::Failed.is_busy());
        assert_eq!(SessionPhase::Exchanging.to_string(), "exchanging");
    }

    #[test]
    fn serializes_snapshot() {
        let state = DeviceSessionState::new(address());
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["address"], "01:02:03:04:05:06 @ <unresolved>");
        assert_eq!(json["phase"], "idle");
    }
}
