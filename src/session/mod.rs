// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device session: the stateful client for one HVAC unit.
//!
//! A [`DeviceSession`] combines a [`Transport`], a [`Resolver`] and the codec
//! into a reconnect-capable client. It keeps the last decoded status, counts
//! consecutive failures and serializes every operation: at most one
//! request is on the wire at a time, and a concurrent call waits for the
//! in-flight one to finish before merging over the state it produced.
//!
//! # Retry policy
//!
//! `Timeout`, `Network` and `DeviceUnreachable` failures are retried once
//! after re-resolving the address. `MalformedPacket` is reported at once.
//! Either way a failed operation increments the failure counter; the device
//! is reported unavailable once the counter reaches the poll policy's
//! failure threshold.
//!
//! # Examples
//!
//! ```no_run
//! use hpa4911_lib::DeviceSession;
//! use hpa4911_lib::command::PartialCommand;
//! use hpa4911_lib::types::HvacMode;
//!
//! # async fn example() -> hpa4911_lib::Result<()> {
//! let session = DeviceSession::builder("A4:CF:12:00:9B:01".parse()?)
//!     .with_ip("192.168.1.40".parse().unwrap())
//!     .with_friendly_name("Bedroom")
//!     .build_udp()
//!     .await?;
//!
//! let status = session.refresh().await?;
//! println!("{} °C", status.current_temperature());
//!
//! session.apply(PartialCommand::new().mode(HvacMode::Heat)).await?;
//! # Ok(())
//! # }
//! ```

mod builder;
pub mod poller;
mod session_id;

pub use builder::DeviceSessionBuilder;
pub use session_id::SessionId;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;

use crate::command::{
    BatteryQuery, Command, CommandFrame, EnumerateQuery, PartialCommand, StatusQuery,
    encode_command,
};
use crate::config::SessionOptions;
use crate::discovery::Resolver;
use crate::error::{Error, PacketError, Result};
use crate::protocol::Transport;
use crate::protocol::packet::{
    CMD_ACK, CMD_CUSTOM, CMD_HVAC_SET, CMD_JOIN, CMD_NACK, CMD_STATUS, SequenceCounter,
    command_id,
};
use crate::response::{
    BatteryStatus, DeviceInfo, Reply, StatusRecord, decode_battery_status, decode_device_info,
    decode_status, is_reply_from,
};
use crate::state::{DeviceSessionState, SessionPhase};
use crate::subscription::{CallbackRegistry, Subscribable, SubscriptionId};
use crate::types::{DeviceAddress, MacAddress};

/// What an operation asks of the device.
#[derive(Debug, Clone, Copy)]
enum Request {
    Status,
    Command(CommandFrame),
    Identify,
    Battery,
}

impl Request {
    const fn name(&self) -> &'static str {
        match self {
            Self::Status => "refresh",
            Self::Command(_) => "apply",
            Self::Identify => "device_info",
            Self::Battery => "battery_status",
        }
    }

    /// Status-producing requests drive the failure counter.
    const fn tracks_health(&self) -> bool {
        matches!(self, Self::Status | Self::Command(_))
    }
}

/// What an operation got back.
#[derive(Debug)]
enum Outcome {
    Status(StatusRecord),
    Info(DeviceInfo),
    Battery(BatteryStatus),
}

/// Client for one HVAC unit.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct DeviceSession<T: Transport> {
    id: SessionId,
    friendly_name: Option<String>,
    transport: Arc<T>,
    resolver: Resolver<T>,
    sequence: Arc<SequenceCounter>,
    options: SessionOptions,
    /// Serializes operations.
    operation: tokio::sync::Mutex<()>,
    /// Start of the last operation, for poll spacing.
    last_attempt: Mutex<Option<Instant>>,
    state: RwLock<DeviceSessionState>,
    callbacks: CallbackRegistry,
}

impl DeviceSession<crate::protocol::UdpTransport> {
    /// Starts building a session for the device with `mac`.
    #[must_use]
    pub fn builder(mac: MacAddress) -> DeviceSessionBuilder {
        DeviceSessionBuilder::new(mac)
    }
}

impl<T: Transport> DeviceSession<T> {
    pub(crate) fn new(
        transport: Arc<T>,
        address: DeviceAddress,
        friendly_name: Option<String>,
        options: SessionOptions,
    ) -> Self {
        let sequence = Arc::new(SequenceCounter::new());
        let resolver =
            Resolver::with_sequence(Arc::clone(&transport), &options, Arc::clone(&sequence));
        let id = SessionId::new();
        tracing::debug!(session = %id, address = %address, "Session created");
        Self {
            id,
            friendly_name,
            transport,
            resolver,
            sequence,
            options,
            operation: tokio::sync::Mutex::new(()),
            last_attempt: Mutex::new(None),
            state: RwLock::new(DeviceSessionState::new(address)),
            callbacks: CallbackRegistry::new(),
        }
    }

    /// Returns the session identifier.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Returns the device MAC.
    #[must_use]
    pub fn mac(&self) -> MacAddress {
        self.state.read().address.mac()
    }

    /// Returns the friendly name, if configured.
    #[must_use]
    pub fn friendly_name(&self) -> Option<&str> {
        self.friendly_name.as_deref()
    }

    /// Returns the session options.
    #[must_use]
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Returns the current device address.
    #[must_use]
    pub fn address(&self) -> DeviceAddress {
        self.state.read().address
    }

    /// Returns the last decoded status.
    #[must_use]
    pub fn last_status(&self) -> Option<StatusRecord> {
        self.state.read().last_status
    }

    /// Returns a consistent copy of the session state.
    #[must_use]
    pub fn state(&self) -> DeviceSessionState {
        self.state.read().clone()
    }

    /// Returns the request-cycle phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.state.read().phase
    }

    /// Returns failed operations since the last success.
    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.state.read().consecutive_failures
    }

    /// Returns `false` once the failure threshold has been reached.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.state
            .read()
            .is_available(self.options.poll.failure_threshold)
    }

    /// Reads the device status.
    ///
    /// # Errors
    ///
    /// Returns `DeviceUnreachable`, `Timeout` or `Network` when the retry
    /// also fails, and `MalformedPacket` when the reply cannot be decoded.
    pub async fn refresh(&self) -> Result<StatusRecord> {
        let _operation = self.operation.lock().await;
        self.mark_attempt();
        self.status_operation(Request::Status).await
    }

    /// Merges `command` over the last known state and sends the result.
    ///
    /// Fields not set in `command` keep their last known value, or the
    /// protocol defaults before the first status.
    ///
    /// # Errors
    ///
    /// Same as [`refresh`](Self::refresh); a NACK from the device is
    /// `MalformedPacket(Rejected)`.
    pub async fn apply(&self, command: PartialCommand) -> Result<StatusRecord> {
        let _operation = self.operation.lock().await;
        self.mark_attempt();
        let frame = {
            let state = self.state.read();
            command.merge_over(state.last_status.as_ref(), state.resume_mode)
        };
        tracing::debug!(session = %self.id, ?command, ?frame, "Applying command");
        self.status_operation(Request::Command(frame)).await
    }

    /// Automatic poll entry point.
    ///
    /// Returns `Ok(None)` without touching the network when the poll
    /// interval (lengthened by backoff) has not elapsed since the last
    /// operation started; otherwise behaves like [`refresh`](Self::refresh).
    ///
    /// # Errors
    ///
    /// Same as [`refresh`](Self::refresh).
    pub async fn poll(&self) -> Result<Option<StatusRecord>> {
        let _operation = self.operation.lock().await;
        if !self.next_poll_delay().is_zero() {
            tracing::trace!(session = %self.id, "Poll skipped, interval not elapsed");
            return Ok(None);
        }
        self.mark_attempt();
        self.status_operation(Request::Status).await.map(Some)
    }

    /// Returns the current poll interval, including backoff.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.options.poll.interval_for(self.consecutive_failures())
    }

    /// Returns how long until the next automatic poll is due.
    #[must_use]
    pub fn next_poll_delay(&self) -> Duration {
        match *self.last_attempt.lock() {
            Some(at) => self.poll_interval().saturating_sub(at.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Reads the bridge identification.
    ///
    /// # Errors
    ///
    /// Same as [`refresh`](Self::refresh).
    pub async fn device_info(&self) -> Result<DeviceInfo> {
        let _operation = self.operation.lock().await;
        match self.run(Request::Identify).await? {
            Outcome::Info(info) => Ok(info),
            other => Err(unexpected(CMD_JOIN, &other)),
        }
    }

    /// Reads signal strength and battery level.
    ///
    /// # Errors
    ///
    /// Same as [`refresh`](Self::refresh).
    pub async fn battery_status(&self) -> Result<BatteryStatus> {
        let _operation = self.operation.lock().await;
        match self.run(Request::Battery).await? {
            Outcome::Battery(status) => Ok(status),
            other => Err(unexpected(CMD_CUSTOM, &other)),
        }
    }

    fn mark_attempt(&self) {
        *self.last_attempt.lock() = Some(Instant::now());
    }

    fn set_phase(&self, phase: SessionPhase) {
        self.state.write().phase = phase;
    }

    async fn status_operation(&self, request: Request) -> Result<StatusRecord> {
        match self.run(request).await? {
            Outcome::Status(status) => Ok(status),
            other => Err(unexpected(CMD_STATUS, &other)),
        }
    }

    /// Runs one operation with retry and records the result.
    ///
    /// Callers hold the operation lock.
    async fn run(&self, request: Request) -> Result<Outcome> {
        let mac = self.mac();
        let result = match self.attempt(request, false).await {
            Err(e) if e.is_retryable() => {
                tracing::warn!(
                    session = %self.id,
                    mac = %mac,
                    operation = request.name(),
                    error = %e,
                    "Exchange failed, re-resolving and retrying"
                );
                self.attempt(request, true).await
            }
            other => other,
        };

        match &result {
            Ok(Outcome::Status(status)) => self.record_success(*status),
            Ok(_) => self.set_phase(SessionPhase::Succeeded),
            Err(e) => self.record_failure(request, e),
        }
        result
    }

    /// Resolves if needed, then performs a single exchange.
    async fn attempt(&self, request: Request, force_resolve: bool) -> Result<Outcome> {
        let mut address = self.address();
        if force_resolve || address.ip().is_none() {
            self.set_phase(SessionPhase::Resolving);
            address = self.resolver.resolve(address).await?;
            self.state.write().address = address;
        }
        let target = address
            .socket_addr()
            .ok_or(Error::DeviceUnreachable { mac: address.mac() })?;

        self.set_phase(SessionPhase::Exchanging);
        self.exchange(target, address.mac(), request).await
    }

    async fn exchange(
        &self,
        target: SocketAddr,
        mac: MacAddress,
        request: Request,
    ) -> Result<Outcome> {
        let timeout = self.options.exchange_timeout;
        tracing::debug!(
            session = %self.id,
            mac = %mac,
            ip = %target.ip(),
            operation = request.name(),
            "Exchanging"
        );

        match request {
            Request::Status => self.query_status(target, mac).await.map(Outcome::Status),
            Request::Command(frame) => {
                let packet = encode_command(&frame, mac, self.sequence.next());
                let reply = self
                    .transport
                    .exchange(
                        target,
                        &packet,
                        move |b| is_reply_from(b, mac, &[CMD_STATUS, CMD_ACK, CMD_NACK]),
                        timeout,
                    )
                    .await?;
                match Reply::decode(&reply.bytes)? {
                    Reply::Status(status) => Ok(Outcome::Status(status)),
                    Reply::Nack => Err(PacketError::Rejected {
                        command: CMD_HVAC_SET,
                    }
                    .into()),
                    Reply::Ack => {
                        tracing::debug!(session = %self.id, "Command acknowledged, polling status");
                        self.query_status(target, mac).await.map(Outcome::Status)
                    }
                    _ => Err(PacketError::UnexpectedCommand {
                        expected: CMD_STATUS,
                        actual: command_id(&reply.bytes).unwrap_or_default(),
                    }
                    .into()),
                }
            }
            Request::Identify => {
                let packet = EnumerateQuery.encode(MacAddress::BROADCAST, self.sequence.next());
                let reply = self
                    .transport
                    .exchange(
                        target,
                        &packet,
                        move |b| is_reply_from(b, mac, &[CMD_JOIN]),
                        timeout,
                    )
                    .await?;
                Ok(Outcome::Info(decode_device_info(&reply.bytes)?))
            }
            Request::Battery => {
                let packet = BatteryQuery.encode(mac, self.sequence.next());
                let reply = self
                    .transport
                    .exchange(
                        target,
                        &packet,
                        move |b| is_reply_from(b, mac, &[CMD_CUSTOM]),
                        timeout,
                    )
                    .await?;
                Ok(Outcome::Battery(decode_battery_status(&reply.bytes)?))
            }
        }
    }

    async fn query_status(&self, target: SocketAddr, mac: MacAddress) -> Result<StatusRecord> {
        let packet = StatusQuery.encode(mac, self.sequence.next());
        let reply = self
            .transport
            .exchange(
                target,
                &packet,
                move |b| is_reply_from(b, mac, &[CMD_STATUS]),
                self.options.exchange_timeout,
            )
            .await?;
        Ok(decode_status(&reply.bytes)?)
    }

    fn record_success(&self, status: StatusRecord) {
        let threshold = self.options.poll.failure_threshold;
        let (changes, recovered) = {
            let mut state = self.state.write();
            let was_available = state.is_available(threshold);
            let changes = state.record_success(status, Utc::now());
            (changes, !was_available)
        };

        tracing::debug!(
            session = %self.id,
            mode = %status.mode(),
            target = %status.target_temperature(),
            current = status.current_temperature(),
            changed = changes.len(),
            "Status updated"
        );
        if recovered {
            tracing::info!(session = %self.id, mac = %self.mac(), "Device available again");
            self.callbacks.dispatch_availability(true);
        }
        self.callbacks.dispatch_status(&status, &changes);
    }

    fn record_failure(&self, request: Request, error: &Error) {
        let mac = self.mac();
        if !request.tracks_health() {
            self.set_phase(SessionPhase::Failed);
            tracing::warn!(
                session = %self.id,
                mac = %mac,
                operation = request.name(),
                error = %error,
                "Query failed"
            );
            return;
        }

        let threshold = self.options.poll.failure_threshold;
        let failures = self.state.write().record_failure();

        if matches!(error, Error::MalformedPacket(_)) {
            tracing::error!(
                session = %self.id,
                mac = %mac,
                operation = request.name(),
                failures,
                error = %error,
                "Device reply could not be decoded"
            );
        } else {
            tracing::warn!(
                session = %self.id,
                mac = %mac,
                operation = request.name(),
                failures,
                error = %error,
                "Operation failed"
            );
        }

        if failures == threshold {
            tracing::warn!(session = %self.id, mac = %mac, failures, "Device unavailable");
            self.callbacks.dispatch_availability(false);
        }
    }
}

/// Error for an operation that got a different kind of reply than it asked for.
fn unexpected(expected: u8, outcome: &Outcome) -> Error {
    let actual = match outcome {
        Outcome::Status(_) => CMD_STATUS,
        Outcome::Info(_) => CMD_JOIN,
        Outcome::Battery(_) => CMD_CUSTOM,
    };
    PacketError::UnexpectedCommand { expected, actual }.into()
}

impl<T: Transport> Subscribable for DeviceSession<T> {
    fn on_status<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&StatusRecord) + Send + Sync + 'static,
    {
        self.callbacks.on_status(callback)
    }

    fn on_change<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&crate::state::StatusChange) + Send + Sync + 'static,
    {
        self.callbacks.on_change(callback)
    }

    fn on_availability<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.callbacks.on_availability(callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.callbacks.unsubscribe(id)
    }
}

impl<T: Transport> std::fmt::Debug for DeviceSession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("DeviceSession")
            .field("id", &self.id)
            .field("friendly_name", &self.friendly_name)
            .field("address", &state.address)
            .field("phase", &state.phase)
            .field("consecutive_failures", &state.consecutive_failures)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_reply_names_the_requested_command() {
        let battery = Outcome::Battery(BatteryStatus {
            rssi: 0,
            battery_level: 0,
            ir_mac: None,
        });
        assert!(matches!(
            unexpected(CMD_JOIN, &battery),
            Error::MalformedPacket(PacketError::UnexpectedCommand {
                expected: CMD_JOIN,
                actual: CMD_CUSTOM,
            })
        ));

        let info = Outcome::Info(DeviceInfo::default());
        assert!(matches!(
            unexpected(CMD_CUSTOM, &info),
            Error::MalformedPacket(PacketError::UnexpectedCommand {
                expected: CMD_CUSTOM,
                actual: CMD_JOIN,
            })
        ));
    }
}
