// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the HPA-4911 library.
//!
//! The hierarchy mirrors how failures travel through the stack:
//!
//! - [`ValueError`]: a caller asked for a value outside the supported domain.
//!   Raised before anything touches the network.
//! - [`PacketError`]: a reply could not be decoded. Indicates a firmware or
//!   protocol mismatch, never retried.
//! - [`Error::DeviceUnreachable`], [`Error::Timeout`], [`Error::Network`]:
//!   transient transport failures, retried once by the session.

use std::time::Duration;

use thiserror::Error;

use crate::types::MacAddress;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// A requested value is outside the supported domain.
    #[error("validation error: {0}")]
    Validation(#[from] ValueError),

    /// A reply packet decoded to an invalid or unsupported value.
    #[error("malformed packet: {0}")]
    MalformedPacket(#[from] PacketError),

    /// No address could be resolved for the device.
    #[error("device {mac} is unreachable")]
    DeviceUnreachable {
        /// Hardware address of the device that could not be found.
        mac: MacAddress,
    },

    /// No reply arrived within the exchange window.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// The operating system reported a socket-level failure.
    #[error("network error: {0}")]
    Network(#[from] std::io::Error),
}

impl Error {
    /// Creates a timeout error for the given window.
    #[must_use]
    pub fn timeout(window: Duration) -> Self {
        Self::Timeout(u64::try_from(window.as_millis()).unwrap_or(u64::MAX))
    }

    /// Returns `true` for failures that a later attempt may resolve.
    ///
    /// `MalformedPacket` and `Validation` are permanent: repeating the same
    /// request yields the same result.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::DeviceUnreachable { .. } | Self::Timeout(_) | Self::Network(_)
        )
    }
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: i32,
        /// Maximum allowed value.
        max: i32,
        /// The actual value that was provided.
        actual: i32,
    },

    /// A temperature was not a whole number of degrees.
    #[error("temperature {0} is not a whole degree")]
    FractionalTemperature(f64),

    /// A MAC address string could not be parsed.
    #[error("invalid MAC address: {0}")]
    InvalidMac(String),

    /// An unknown HVAC mode name was provided.
    #[error("invalid HVAC mode: {0}")]
    InvalidHvacMode(String),

    /// An unknown fan mode name was provided.
    #[error("invalid fan mode: {0}")]
    InvalidFanMode(String),

    /// An unknown swing mode name was provided.
    #[error("invalid swing mode: {0}")]
    InvalidSwingMode(String),

    /// An invalid power state string was provided.
    #[error("invalid power state: {0}")]
    InvalidPowerState(String),
}

/// Errors raised while decoding device replies.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PacketError {
    /// The datagram is shorter than the frame it claims to be.
    #[error("packet too short: expected {expected} bytes, got {actual}")]
    TooShort {
        /// Minimum length for this frame type.
        expected: usize,
        /// Length of the received datagram.
        actual: usize,
    },

    /// The header carries a different command than expected.
    #[error("unexpected command {actual} (expected {expected})")]
    UnexpectedCommand {
        /// Command id the decoder was looking for.
        expected: u8,
        /// Command id found in the header.
        actual: u8,
    },

    /// A reply payload starts with an unknown subcommand or status type.
    #[error("unexpected payload type {0}")]
    UnexpectedPayloadType(u8),

    /// The mode byte is not a known mode code.
    #[error("unknown mode code {0}")]
    UnknownModeCode(u8),

    /// The fan byte is not a known fan code.
    #[error("unknown fan code {0}")]
    UnknownFanCode(u8),

    /// The target temperature is fractional or outside [16, 30] °C.
    #[error("target temperature {0} (x100) is not a whole degree in [16, 30]")]
    TargetOutOfRange(i16),

    /// The device answered with a NACK.
    #[error("device rejected command {command}")]
    Rejected {
        /// Command id that was rejected.
        command: u8,
    },

    /// The payload text could not be interpreted.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_error_display() {
        let err = ValueError::OutOfRange {
            min: 16,
            max: 30,
            actual: 31,
        };
        assert_eq!(err.to_string(), "value 31 is out of range [16, 30]");
    }

    #[test]
    fn error_from_value_error() {
        let err: Error = ValueError::InvalidFanMode("turbo".to_string()).into();
        assert!(matches!(err, Error::Validation(ValueError::InvalidFanMode(_))));
        assert!(!err.is_retryable());
    }

    #[test]
    fn packet_error_display() {
        let err = PacketError::TooShort {
            expected: 29,
            actual: 17,
        };
        assert_eq!(
            err.to_string(),
            "packet too short: expected 29 bytes, got 17"
        );
    }

    #[test]
    fn malformed_packet_is_not_retryable() {
        let err: Error = PacketError::UnknownModeCode(9).into();
        assert!(!err.is_retryable());
    }

    #[test]
    fn transport_failures_are_retryable() {
        assert!(Error::timeout(Duration::from_secs(4)).is_retryable());
        assert!(Error::Network(std::io::Error::other("down")).is_retryable());
        assert!(
            Error::DeviceUnreachable {
                mac: MacAddress::BROADCAST
            }
            .is_retryable()
        );
    }

    #[test]
    fn timeout_reports_milliseconds() {
        let err = Error::timeout(Duration::from_millis(2500));
        assert_eq!(err.to_string(), "request timed out after 2500 ms");
    }
}
