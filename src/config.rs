// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device and session configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;
use crate::types::MacAddress;

/// Port the bridge listens on.
pub const DEFAULT_DEVICE_PORT: u16 = 20910;

/// Port the client binds so unsolicited device traffic also reaches it.
pub const DEFAULT_LISTEN_PORT: u16 = 20911;

/// A configured device, as collected by the host's setup flow.
///
/// # Examples
///
/// ```
/// use hpa4911_lib::config::DeviceConfig;
///
/// let config = DeviceConfig::new("Bedroom", "a4-cf-12-00-9b-01")
///     .unwrap()
///     .with_ip_address("192.168.1.40".parse().unwrap());
///
/// assert_eq!(config.mac.to_string(), "A4:CF:12:00:9B:01");
///
/// let json = serde_json::to_string(&config).unwrap();
/// assert!(json.contains("\"mac\":\"A4:CF:12:00:9B:01\""));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Friendly name shown by the host.
    pub name: String,
    /// Hardware address.
    pub mac: MacAddress,
    /// Last known IP, if the user supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<IpAddr>,
}

impl DeviceConfig {
    /// Creates a configuration from a name and a MAC string.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidMac` if the MAC cannot be parsed.
    pub fn new(name: impl Into<String>, mac: &str) -> Result<Self, ValueError> {
        Ok(Self {
            name: name.into(),
            mac: mac.parse()?,
            ip_address: None,
        })
    }

    /// Sets the last known IP.
    #[must_use]
    pub fn with_ip_address(mut self, ip: IpAddr) -> Self {
        self.ip_address = Some(ip);
        self
    }
}

/// Automatic polling cadence with backoff after repeated failures.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use hpa4911_lib::config::PollPolicy;
///
/// let policy = PollPolicy::default();
/// assert_eq!(policy.interval_for(0), Duration::from_secs(30));
/// assert_eq!(policy.interval_for(3), Duration::from_secs(60));
/// assert_eq!(policy.interval_for(4), Duration::from_secs(120));
/// assert_eq!(policy.interval_for(50), Duration::from_secs(480));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Interval while the device answers.
    pub base_interval: Duration,
    /// Consecutive failures before backoff starts.
    pub failure_threshold: u32,
    /// Growth factor per failure past the threshold.
    pub backoff_multiplier: f32,
    /// Upper bound on the interval.
    pub max_interval: Duration,
}

impl PollPolicy {
    /// Creates a policy with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base interval.
    #[must_use]
    pub fn with_base_interval(mut self, interval: Duration) -> Self {
        self.base_interval = interval;
        self
    }

    /// Sets the failure threshold.
    #[must_use]
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Sets the backoff multiplier.
    ///
    /// A multiplier at or below 1.0, or NaN, disables growth: the interval
    /// stays at the base.
    #[must_use]
    pub fn with_backoff_multiplier(mut self, multiplier: f32) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Sets the maximum interval.
    #[must_use]
    pub fn with_max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = interval;
        self
    }

    /// Returns the interval to wait after `failures` consecutive failures.
    ///
    /// Never shorter than the base interval, whatever the multiplier.
    #[must_use]
    pub fn interval_for(&self, failures: u32) -> Duration {
        if failures < self.failure_threshold {
            return self.base_interval;
        }

        let exponent = failures - self.failure_threshold + 1;
        let multiplier = self
            .backoff_multiplier
            .powi(i32::try_from(exponent).unwrap_or(i32::MAX));

        // Base interval is seconds to minutes, far from f32 precision limits.
        #[allow(clippy::cast_precision_loss)]
        let interval_ms = self.base_interval.as_millis() as f32 * multiplier;

        // Clamped below; saturating cast handles infinity.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let interval = Duration::from_millis(interval_ms as u64);

        interval.min(self.max_interval).max(self.base_interval)
    }

    /// Returns `true` once `failures` has reached the backoff threshold.
    #[must_use]
    pub fn is_backing_off(&self, failures: u32) -> bool {
        failures >= self.failure_threshold
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_secs(30),
            failure_threshold: 3,
            backoff_multiplier: 2.0,
            max_interval: Duration::from_secs(8 * 60),
        }
    }
}

/// Network and timing options for a session.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use hpa4911_lib::config::SessionOptions;
///
/// let options = SessionOptions::default()
///     .with_listen_port(0)
///     .with_exchange_timeout(Duration::from_secs(3));
/// assert_eq!(options.device_port, 20910);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    /// Port the bridge listens on.
    pub device_port: u16,
    /// Local port to bind (0 for any).
    pub listen_port: u16,
    /// Address discovery broadcasts go to.
    pub broadcast_addr: IpAddr,
    /// Wait for a reply to a command or status query.
    pub exchange_timeout: Duration,
    /// Wait for a reply when probing a cached IP.
    pub probe_timeout: Duration,
    /// How long discovery collects broadcast replies.
    pub discovery_window: Duration,
    /// Automatic polling cadence.
    pub poll: PollPolicy,
}

impl SessionOptions {
    /// Creates options with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the device port.
    #[must_use]
    pub fn with_device_port(mut self, port: u16) -> Self {
        self.device_port = port;
        self
    }

    /// Sets the local port.
    #[must_use]
    pub fn with_listen_port(mut self, port: u16) -> Self {
        self.listen_port = port;
        self
    }

    /// Sets the broadcast address.
    #[must_use]
    pub fn with_broadcast_addr(mut self, addr: IpAddr) -> Self {
        self.broadcast_addr = addr;
        self
    }

    /// Sets the exchange timeout.
    #[must_use]
    pub fn with_exchange_timeout(mut self, timeout: Duration) -> Self {
        self.exchange_timeout = timeout;
        self
    }

    /// Sets the probe timeout.
    #[must_use]
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Sets the discovery window.
    #[must_use]
    pub fn with_discovery_window(mut self, window: Duration) -> Self {
        self.discovery_window = window;
        self
    }

    /// Sets the polling policy.
    #[must_use]
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Returns the local address to bind.
    #[must_use]
    pub fn listen_addr(&self) -> SocketAddr {
        let any = match self.broadcast_addr {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            IpAddr::V6(_) => IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED),
        };
        SocketAddr::new(any, self.listen_port)
    }

    /// Returns where broadcasts are sent.
    #[must_use]
    pub fn broadcast_target(&self) -> SocketAddr {
        SocketAddr::new(self.broadcast_addr, self.device_port)
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            device_port: DEFAULT_DEVICE_PORT,
            listen_port: DEFAULT_LISTEN_PORT,
            broadcast_addr: IpAddr::V4(Ipv4Addr::BROADCAST),
            exchange_timeout: Duration::from_secs(4),
            probe_timeout: Duration::from_secs(2),
            discovery_window: Duration::from_secs(2),
            poll: PollPolicy::default(),
        }
    }
}
