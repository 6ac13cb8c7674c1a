// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device session builder.

use std::net::IpAddr;
use std::sync::Arc;

use crate::config::{DeviceConfig, SessionOptions};
use crate::error::Result;
use crate::protocol::{Transport, UdpTransport};
use crate::session::DeviceSession;
use crate::types::{DeviceAddress, MacAddress};

/// Builder for [`DeviceSession`].
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use hpa4911_lib::DeviceSession;
/// use hpa4911_lib::config::SessionOptions;
///
/// # async fn example() -> hpa4911_lib::Result<()> {
/// // Address resolved by broadcast on first use
/// let session = DeviceSession::builder("A4:CF:12:00:9B:01".parse()?)
///     .build_udp()
///     .await?;
///
/// // Cached IP and shorter timeouts
/// let session = DeviceSession::builder("A4:CF:12:00:9B:02".parse()?)
///     .with_ip("192.168.1.41".parse().unwrap())
///     .with_options(SessionOptions::new().with_exchange_timeout(Duration::from_secs(2)))
///     .build_udp()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DeviceSessionBuilder {
    mac: MacAddress,
    ip: Option<IpAddr>,
    friendly_name: Option<String>,
    options: SessionOptions,
}

impl DeviceSessionBuilder {
    pub(crate) fn new(mac: MacAddress) -> Self {
        Self {
            mac,
            ip: None,
            friendly_name: None,
            options: SessionOptions::default(),
        }
    }

    /// Creates a builder from a configuration entry.
    #[must_use]
    pub fn from_config(config: &DeviceConfig) -> Self {
        let mut builder = Self::new(config.mac).with_friendly_name(config.name.clone());
        builder.ip = config.ip_address;
        builder
    }

    /// Sets the last known IP of the device.
    ///
    /// Without one, the first operation resolves the address by broadcast.
    #[must_use]
    pub fn with_ip(mut self, ip: IpAddr) -> Self {
        self.ip = Some(ip);
        self
    }

    /// Sets the name used by the host for this device.
    #[must_use]
    pub fn with_friendly_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = Some(name.into());
        self
    }

    /// Replaces the session options.
    #[must_use]
    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the configured options.
    #[must_use]
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Binds a UDP socket on the configured listen port and builds the session.
    ///
    /// No packet is sent.
    ///
    /// # Errors
    ///
    /// Returns `Error::Network` if the socket cannot be bound.
    pub async fn build_udp(self) -> Result<DeviceSession<UdpTransport>> {
        let transport =
            UdpTransport::bind(self.options.listen_addr(), self.options.broadcast_target()).await?;
        Ok(self.build_with_transport(transport))
    }

    /// Builds the session over a caller-provided transport.
    #[must_use]
    pub fn build_with_transport<T: Transport>(self, transport: T) -> DeviceSession<T> {
        self.build_with_shared_transport(Arc::new(transport))
    }

    /// Builds the session over a transport shared with other sessions.
    #[must_use]
    pub fn build_with_shared_transport<T: Transport>(self, transport: Arc<T>) -> DeviceSession<T> {
        let address = DeviceAddress::new(self.mac, self.ip, self.options.device_port);
        DeviceSession::new(transport, address, self.friendly_name, self.options)
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    const MAC: MacAddress = MacAddress::new([0xA4, 0xCF, 0x12, 0x00, 0x9B, 0x01]);

    #[test]
    fn builder_defaults() {
        let builder = DeviceSessionBuilder::new(MAC);
        assert!(builder.ip.is_none());
        assert!(builder.friendly_name.is_none());
        assert_eq!(builder.options(), &SessionOptions::default());
    }

    #[test]
    fn builder_from_config() {
        let ip = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 40));
        let config = DeviceConfig::new("Bedroom", "a4:cf:12:00:9b:01")
            .unwrap()
            .with_ip_address(ip);
        let builder = DeviceSessionBuilder::from_config(&config);
        assert_eq!(builder.mac, MAC);
        assert_eq!(builder.ip, Some(ip));
        assert_eq!(builder.friendly_name.as_deref(), Some("Bedroom"));
    }

    #[test]
    fn builder_with_options_overrides_port() {
        let options = SessionOptions::new().with_device_port(4000);
        let builder = DeviceSessionBuilder::new(MAC).with_options(options);
        assert_eq!(builder.options().device_port, 4000);
    }
}
