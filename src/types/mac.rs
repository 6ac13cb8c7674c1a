// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hardware address type.
//!
//! The MAC is the durable identity of an HPA-4911 bridge: its IP may drift
//! with DHCP, but every reply carries the MAC in its header.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValueError;

/// A 6-byte hardware address.
///
/// Parsing accepts `AA:BB:CC:DD:EE:FF`, `aa-bb-cc-dd-ee-ff` and bare
/// `aabbccddeeff`; display always uses the upper-case colon form.
///
/// # Examples
///
/// ```
/// use hpa4911_lib::types::MacAddress;
///
/// let mac: MacAddress = "a4-cf-12-00-9b-01".parse().unwrap();
/// assert_eq!(mac.to_string(), "A4:CF:12:00:9B:01");
/// assert!("a4:cf:12".parse::<MacAddress>().is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// The all-zero address used as the source of outbound packets.
    pub const UNSPECIFIED: Self = Self([0; 6]);

    /// The broadcast address used for discovery queries.
    pub const BROADCAST: Self = Self([0xFF; 6]);

    /// Creates an address from raw bytes.
    #[must_use]
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Reads an address from the first six bytes of a slice.
    ///
    /// Returns `None` if the slice is shorter than six bytes.
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; 6] = bytes.get(..6)?.try_into().ok()?;
        Some(Self(bytes))
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Returns the address without separators, e.g. `A4CF12009B01`.
    ///
    /// This is the form used as a unique id by host integrations.
    #[must_use]
    pub fn compact(&self) -> String {
        self.0.iter().map(|b| format!("{b:02X}")).collect()
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

impl fmt::Debug for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddress({self})")
    }
}

impl FromStr for MacAddress {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValueError::InvalidMac(s.to_string());

        let trimmed = s.trim();
        let hex: String = if trimmed.contains([':', '-']) {
            let parts: Vec<&str> = trimmed.split([':', '-']).collect();
            if parts.len() != 6 || parts.iter().any(|p| p.len() != 2) {
                return Err(invalid());
            }
            parts.concat()
        } else {
            trimmed.to_string()
        };

        if hex.len() != 12 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let mut bytes = [0u8; 6];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        }
        Ok(Self(bytes))
    }
}

impl TryFrom<&str> for MacAddress {
    type Error = ValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_colon_form() {
        let mac: MacAddress = "A4:CF:12:00:9B:01".parse().unwrap();
        assert_eq!(mac.octets(), [0xA4, 0xCF, 0x12, 0x00, 0x9B, 0x01]);
    }

    #[test]
    fn parse_dash_and_lowercase() {
        let mac: MacAddress = "a4-cf-12-00-9b-01".parse().unwrap();
        assert_eq!(mac.to_string(), "A4:CF:12:00:9B:01");
    }

    #[test]
    fn parse_bare_hex() {
        let mac: MacAddress = "a4cf12009b01".parse().unwrap();
        assert_eq!(mac.compact(), "A4CF12009B01");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("".parse::<MacAddress>().is_err());
        assert!("A4:CF:12:00:9B".parse::<MacAddress>().is_err());
        assert!("A4:CF:12:00:9B:0G".parse::<MacAddress>().is_err());
        assert!("A4:CF:12:00:9B:011".parse::<MacAddress>().is_err());
        assert!("A4CF12009B".parse::<MacAddress>().is_err());
    }

    #[test]
    fn from_slice_requires_six_bytes() {
        assert_eq!(
            MacAddress::from_slice(&[1, 2, 3, 4, 5, 6, 7]),
            Some(MacAddress::new([1, 2, 3, 4, 5, 6]))
        );
        assert_eq!(MacAddress::from_slice(&[1, 2, 3]), None);
    }

    #[test]
    fn serde_uses_string_form() {
        let mac = MacAddress::new([0xA4, 0xCF, 0x12, 0x00, 0x9B, 0x01]);
        let json = serde_json::to_string(&mac).unwrap();
        assert_eq!(json, "\"A4:CF:12:00:9B:01\"");

        let back: MacAddress = serde_json::from_str("\"a4cf12009b01\"").unwrap();
        assert_eq!(back, mac);
    }
}
