// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared helpers: an in-memory scripted transport and packet builders.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use hpa4911_lib::command::CommandFrame;
use hpa4911_lib::config::SessionOptions;
use hpa4911_lib::protocol::packet::{
    CMD_ACK, CMD_CUSTOM, CMD_JOIN, CMD_NACK, CUSTOM_STATUS_REQUEST, Header,
    JOIN_ENUMERATE_RESPONSE,
};
use hpa4911_lib::protocol::{BroadcastReplies, Datagram, Transport};
use hpa4911_lib::response::{StatusRecord, encode_status};
use hpa4911_lib::types::{FanSpeed, HvacMode, MacAddress, PowerState, TargetTemperature};
use hpa4911_lib::{DeviceSession, Error, Result};
use parking_lot::Mutex;
use tokio::sync::mpsc;

pub const DEVICE_MAC: MacAddress = MacAddress::new([0xA4, 0xCF, 0x12, 0x00, 0x9B, 0x01]);
pub const OTHER_MAC: MacAddress = MacAddress::new([0xA4, 0xCF, 0x12, 0x00, 0x9B, 0x02]);

pub const DEVICE_IP: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 40));
pub const MOVED_IP: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 77));
pub const OTHER_IP: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 90));

pub fn device_addr(ip: IpAddr) -> SocketAddr {
    SocketAddr::new(ip, 20910)
}

// ============================================================================
// Packet builders
// ============================================================================

fn reply_header(source: MacAddress, command: u8) -> Header {
    Header {
        source,
        destination: MacAddress::UNSPECIFIED,
        sequence: 0,
        source_endpoint: 1,
        destination_endpoint: 0,
        command,
    }
}

pub fn record(
    mode: HvacMode,
    fan: FanSpeed,
    swing: bool,
    target: u8,
    current: i16,
) -> StatusRecord {
    let frame = CommandFrame::new(
        PowerState::from(mode.is_active()),
        mode,
        fan,
        swing,
        TargetTemperature::new(target).unwrap(),
    );
    StatusRecord::new(frame, current)
}

pub fn status_bytes(mac: MacAddress, record: &StatusRecord) -> Vec<u8> {
    encode_status(record, mac)
}

/// Cooling at 24 °C, fan auto, no swing, room at 26 °C.
pub fn cooling_status() -> Vec<u8> {
    status_bytes(DEVICE_MAC, &record(HvacMode::Cool, FanSpeed::Auto, false, 24, 26))
}

pub fn ack(mac: MacAddress) -> Vec<u8> {
    reply_header(mac, CMD_ACK).encode().to_vec()
}

pub fn nack(mac: MacAddress) -> Vec<u8> {
    reply_header(mac, CMD_NACK).encode().to_vec()
}

pub fn join_reply(mac: MacAddress, info: &str) -> Vec<u8> {
    let mut payload = vec![JOIN_ENUMERATE_RESPONSE];
    payload.extend_from_slice(info.as_bytes());
    payload.extend_from_slice(&[0, 0, 0]);
    reply_header(mac, CMD_JOIN).with_payload(&payload)
}

pub const IR_MAC: [u8; 7] = [0x3C, 0x71, 0xBF, 0x10, 0x22, 0x5E, 0x01];

pub fn battery_reply(mac: MacAddress, rssi: u8, level: u16) -> Vec<u8> {
    let [lo, hi] = level.to_le_bytes();
    let mut payload = vec![CUSTOM_STATUS_REQUEST, rssi, lo, hi, 0, 0];
    payload.extend_from_slice(&IR_MAC);
    reply_header(mac, CMD_CUSTOM).with_payload(&payload)
}

pub fn command_of(bytes: &[u8]) -> u8 {
    bytes[16]
}

// ============================================================================
// Scripted transport
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentKind {
    Exchange,
    Send,
    Broadcast,
}

#[derive(Debug, Clone)]
pub struct Sent {
    pub kind: SentKind,
    pub target: Option<SocketAddr>,
    pub bytes: Vec<u8>,
}

impl Sent {
    pub fn command(&self) -> u8 {
        command_of(&self.bytes)
    }
}

#[derive(Debug)]
enum Action {
    /// Datagrams the device sends back, in order.
    Replies(Vec<Vec<u8>>),
    Silence,
    NetworkError,
}

#[derive(Debug)]
struct Step {
    delay: Duration,
    action: Action,
}

/// Transport whose answers are scripted per exchange.
///
/// Each `exchange` consumes one step; an empty script behaves like a silent
/// device. Silence sleeps for the full timeout so paused-clock tests see
/// time advance the way it would on a real socket.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    broadcasts: Mutex<VecDeque<Vec<Datagram>>>,
    sent: Mutex<Vec<Sent>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, delay: Duration, action: Action) -> &Self {
        self.steps.lock().push_back(Step { delay, action });
        self
    }

    pub fn reply(&self, bytes: Vec<u8>) -> &Self {
        self.push(Duration::ZERO, Action::Replies(vec![bytes]))
    }

    pub fn replies(&self, datagrams: Vec<Vec<u8>>) -> &Self {
        self.push(Duration::ZERO, Action::Replies(datagrams))
    }

    pub fn reply_after(&self, delay: Duration, bytes: Vec<u8>) -> &Self {
        self.push(delay, Action::Replies(vec![bytes]))
    }

    pub fn silence(&self) -> &Self {
        self.push(Duration::ZERO, Action::Silence)
    }

    pub fn network_error(&self) -> &Self {
        self.push(Duration::ZERO, Action::NetworkError)
    }

    /// Replies delivered to the next broadcast, as `(source ip, bytes)`.
    pub fn broadcast_replies(&self, replies: Vec<(IpAddr, Vec<u8>)>) -> &Self {
        let datagrams = replies
            .into_iter()
            .map(|(ip, bytes)| Datagram {
                bytes,
                from: device_addr(ip),
            })
            .collect();
        self.broadcasts.lock().push_back(datagrams);
        self
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().clone()
    }

    pub fn sent_commands(&self) -> Vec<u8> {
        self.sent.lock().iter().map(Sent::command).collect()
    }

    pub fn exchange_count(&self) -> usize {
        self.sent
            .lock()
            .iter()
            .filter(|s| s.kind == SentKind::Exchange)
            .count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn remaining_steps(&self) -> usize {
        self.steps.lock().len()
    }

    fn record(&self, kind: SentKind, target: Option<SocketAddr>, bytes: &[u8]) {
        self.sent.lock().push(Sent {
            kind,
            target,
            bytes: bytes.to_vec(),
        });
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize, max: &AtomicUsize) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        max.fetch_max(now, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Transport for ScriptedTransport {
    async fn exchange<F>(
        &self,
        target: SocketAddr,
        request: &[u8],
        accept: F,
        timeout: Duration,
    ) -> Result<Datagram>
    where
        F: Fn(&[u8]) -> bool + Send + Sync,
    {
        self.record(SentKind::Exchange, Some(target), request);
        let _in_flight = InFlight::enter(&self.in_flight, &self.max_in_flight);
        let step = self.steps.lock().pop_front().unwrap_or(Step {
            delay: Duration::ZERO,
            action: Action::Silence,
        });

        tokio::time::sleep(step.delay).await;
        match step.action {
            Action::Replies(datagrams) => {
                if let Some(bytes) = datagrams.into_iter().find(|b| accept(b.as_slice())) {
                    return Ok(Datagram {
                        bytes,
                        from: target,
                    });
                }
                tokio::time::sleep(timeout.saturating_sub(step.delay)).await;
                Err(Error::timeout(timeout))
            }
            Action::Silence => {
                tokio::time::sleep(timeout).await;
                Err(Error::timeout(timeout))
            }
            Action::NetworkError => Err(Error::Network(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
        }
    }

    async fn send(&self, target: SocketAddr, request: &[u8]) -> Result<()> {
        self.record(SentKind::Send, Some(target), request);
        Ok(())
    }

    async fn broadcast(&self, request: &[u8], window: Duration) -> Result<BroadcastReplies> {
        self.record(SentKind::Broadcast, None, request);
        let datagrams = self.broadcasts.lock().pop_front().unwrap_or_default();

        let (tx, rx) = mpsc::channel(datagrams.len().max(1));
        for datagram in datagrams {
            let _ = tx.try_send(datagram);
        }
        // Keep the channel open for the whole window, like a real collector.
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            drop(tx);
        });
        Ok(BroadcastReplies::from_channel(rx, window))
    }
}

// ============================================================================
// Session helpers
// ============================================================================

pub fn options() -> SessionOptions {
    SessionOptions::new().with_listen_port(0)
}

/// Session with a cached IP over a shared scripted transport.
pub fn session_with_ip(
    transport: &std::sync::Arc<ScriptedTransport>,
) -> DeviceSession<ScriptedTransport> {
    DeviceSession::builder(DEVICE_MAC)
        .with_ip(DEVICE_IP)
        .with_options(options())
        .build_with_shared_transport(std::sync::Arc::clone(transport))
}

/// Session that must resolve its address first.
pub fn session_without_ip(
    transport: &std::sync::Arc<ScriptedTransport>,
) -> DeviceSession<ScriptedTransport> {
    DeviceSession::builder(DEVICE_MAC)
        .with_options(options())
        .build_with_shared_transport(std::sync::Arc::clone(transport))
}
