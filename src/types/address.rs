// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Network address of a device.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use super::MacAddress;

/// Where a device lives on the network.
///
/// The MAC never changes. The IP is only a cache hint: it is replaced
/// wholesale whenever discovery finds the device somewhere else.
///
/// # Examples
///
/// ```
/// use std::net::{IpAddr, Ipv4Addr};
/// use hpa4911_lib::types::{DeviceAddress, MacAddress};
///
/// let mac: MacAddress = "A4:CF:12:00:9B:01".parse().unwrap();
/// let addr = DeviceAddress::new(mac, None, 20910);
/// assert!(addr.socket_addr().is_none());
///
/// let addr = addr.with_ip(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 40)));
/// assert_eq!(addr.socket_addr().unwrap().to_string(), "192.168.1.40:20910");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceAddress {
    mac: MacAddress,
    ip: Option<IpAddr>,
    port: u16,
}

impl DeviceAddress {
    /// Creates a device address.
    #[must_use]
    pub const fn new(mac: MacAddress, ip: Option<IpAddr>, port: u16) -> Self {
        Self { mac, ip, port }
    }

    /// Returns the hardware address.
    #[must_use]
    pub const fn mac(&self) -> MacAddress {
        self.mac
    }

    /// Returns the cached IP, if any.
    #[must_use]
    pub const fn ip(&self) -> Option<IpAddr> {
        self.ip
    }

    /// Returns the protocol port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the full socket address when an IP is known.
    #[must_use]
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.ip.map(|ip| SocketAddr::new(ip, self.port))
    }

    /// Returns a copy pointing at a different IP.
    #[must_use]
    pub const fn with_ip(self, ip: IpAddr) -> Self {
        Self {
            ip: Some(ip),
            ..self
        }
    }

    /// Returns a copy with the cached IP dropped.
    #[must_use]
    pub const fn without_ip(self) -> Self {
        Self { ip: None, ..self }
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ip {
            Some(ip) => write!(f, "{} @ {}", self.mac, SocketAddr::new(ip, self.port)),
            None => write!(f, "{} @ <unresolved>", self.mac),
        }
    }
}
