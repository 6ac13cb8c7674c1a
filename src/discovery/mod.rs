// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Address resolution and device discovery.
//!
//! A bridge is identified by its MAC; its IP comes from DHCP and drifts.
//! [`Resolver::resolve`] confirms a cached IP with a direct status poll and
//! otherwise asks the whole segment who is out there, keeping only the reply
//! whose header carries the wanted MAC.
//!
//! # Discovery Mechanism
//!
//! 1. A JOIN enumerate (subcommand 4) is broadcast to `FF:FF:FF:FF:FF:FF`
//! 2. Every bridge answers with a JOIN subcommand 2 carrying its
//!    identification string, from its own IP
//! 3. Replies are collected until the discovery window closes
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use hpa4911_lib::config::SessionOptions;
//! use hpa4911_lib::discovery::Resolver;
//! use hpa4911_lib::protocol::UdpTransport;
//!
//! # async fn example() -> hpa4911_lib::Result<()> {
//! let options = SessionOptions::default();
//! let transport = UdpTransport::bind(options.listen_addr(), options.broadcast_target()).await?;
//! let resolver = Resolver::new(Arc::new(transport), &options);
//!
//! for device in resolver.discover(Duration::from_secs(2)).await? {
//!     println!("{} at {} ({})", device.mac, device.ip, device.info.model);
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use crate::command::{Command, EnumerateQuery, StatusQuery};
use crate::config::SessionOptions;
use crate::error::{Error, Result};
use crate::protocol::Transport;
use crate::protocol::packet::{CMD_JOIN, CMD_STATUS, SequenceCounter, source_mac};
use crate::response::{DeviceInfo, decode_device_info, is_reply_from};
use crate::types::{DeviceAddress, MacAddress};

/// A bridge that answered an enumerate broadcast.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DiscoveredDevice {
    /// Hardware address from the reply header.
    pub mac: MacAddress,
    /// Address the reply came from.
    pub ip: IpAddr,
    /// Identification string.
    pub info: DeviceInfo,
}

/// Finds the current IP of a device from its MAC.
#[derive(Debug)]
pub struct Resolver<T: Transport> {
    transport: Arc<T>,
    sequence: Arc<SequenceCounter>,
    probe_timeout: Duration,
    discovery_window: Duration,
}

impl<T: Transport> Resolver<T> {
    /// Creates a resolver using the timing from `options`.
    #[must_use]
    pub fn new(transport: Arc<T>, options: &SessionOptions) -> Self {
        Self::with_sequence(transport, options, Arc::new(SequenceCounter::new()))
    }

    /// Creates a resolver sharing a sequence counter with its session.
    #[must_use]
    pub fn with_sequence(
        transport: Arc<T>,
        options: &SessionOptions,
        sequence: Arc<SequenceCounter>,
    ) -> Self {
        Self {
            transport,
            sequence,
            probe_timeout: options.probe_timeout,
            discovery_window: options.discovery_window,
        }
    }

    /// Returns the current address of the device.
    ///
    /// A cached IP that answers a status poll with the right MAC is kept.
    /// Otherwise the first enumerate reply tagged with the device MAC within
    /// the discovery window provides the new IP.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceUnreachable` if no matching reply arrives before
    /// the window closes, and `Error::Network` if the broadcast cannot be sent.
    pub async fn resolve(&self, address: DeviceAddress) -> Result<DeviceAddress> {
        let mac = address.mac();

        if let Some(target) = address.socket_addr() {
            match self.probe(mac, target).await {
                Ok(()) => {
                    tracing::debug!(mac = %mac, ip = %target.ip(), "Cached address confirmed");
                    return Ok(address);
                }
                Err(e) => {
                    tracing::debug!(
                        mac = %mac,
                        ip = %target.ip(),
                        error = %e,
                        "Probe failed, falling back to discovery"
                    );
                }
            }
        }

        let request = EnumerateQuery.encode(MacAddress::BROADCAST, self.sequence.next());
        let mut replies = self
            .transport
            .broadcast(&request, self.discovery_window)
            .await?;

        while let Some(reply) = replies.recv().await {
            if is_reply_from(&reply.bytes, mac, &[CMD_JOIN]) {
                let resolved = address.with_ip(reply.from.ip());
                tracing::info!(mac = %mac, ip = %reply.from.ip(), "Device resolved");
                return Ok(resolved);
            }
            tracing::trace!(from = %reply.from, "Ignoring reply from another device");
        }

        tracing::warn!(
            mac = %mac,
            window_ms = self.discovery_window.as_millis(),
            "Device not found on the network"
        );
        Err(Error::DeviceUnreachable { mac })
    }

    /// Lists every bridge answering within `window`.
    ///
    /// Each MAC is reported once; replies that cannot be decoded are skipped.
    ///
    /// # Errors
    ///
    /// Returns `Error::Network` if the broadcast cannot be sent.
    pub async fn discover(&self, window: Duration) -> Result<Vec<DiscoveredDevice>> {
        tracing::info!(window_ms = window.as_millis(), "Starting device discovery");

        let request = EnumerateQuery.encode(MacAddress::BROADCAST, self.sequence.next());
        let mut replies = self.transport.broadcast(&request, window).await?;

        let mut seen = HashSet::new();
        let mut devices = Vec::new();
        while let Some(reply) = replies.recv().await {
            let Some(mac) = source_mac(&reply.bytes) else {
                continue;
            };
            match decode_device_info(&reply.bytes) {
                Ok(info) if seen.insert(mac) => {
                    tracing::debug!(
                        mac = %mac,
                        ip = %reply.from.ip(),
                        model = %info.model,
                        "Found device"
                    );
                    devices.push(DiscoveredDevice {
                        mac,
                        ip: reply.from.ip(),
                        info,
                    });
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(from = %reply.from, error = %e, "Skipping undecodable reply");
                }
            }
        }

        tracing::info!(count = devices.len(), "Device discovery completed");
        Ok(devices)
    }

    /// Polls `target` and checks the reply comes from `mac`.
    async fn probe(&self, mac: MacAddress, target: SocketAddr) -> Result<()> {
        let request = StatusQuery.encode(mac, self.sequence.next());
        self.transport
            .exchange(
                target,
                &request,
                move |bytes| is_reply_from(bytes, mac, &[CMD_STATUS]),
                self.probe_timeout,
            )
            .await
            .map(|_| ())
    }
}
