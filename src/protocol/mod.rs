// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Datagram transport for the HPA-4911 protocol.
//!
//! The transport moves bytes and nothing else: it knows sockets and
//! timeouts, while packet layout lives in [`packet`], [`crate::command`]
//! and [`crate::response`].
//!
//! # Implementations
//!
//! - [`UdpTransport`]: tokio UDP socket bound to the client port
//!
//! Sessions are generic over [`Transport`], so tests can substitute a
//! scripted implementation.

pub mod packet;
mod udp;

pub use udp::UdpTransport;

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::error::Result;

/// A received datagram and its sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    /// Raw bytes.
    pub bytes: Vec<u8>,
    /// Address the datagram came from.
    pub from: SocketAddr,
}

/// Replies to a broadcast, delivered as they arrive.
///
/// The sequence ends when the collection window closes. Dropping it early
/// stops collection.
#[derive(Debug)]
pub struct BroadcastReplies {
    rx: mpsc::Receiver<Datagram>,
    deadline: Instant,
}

impl BroadcastReplies {
    /// Wraps a channel fed by a collector; replies are accepted for `window`.
    #[must_use]
    pub fn from_channel(rx: mpsc::Receiver<Datagram>, window: Duration) -> Self {
        Self {
            rx,
            deadline: Instant::now() + window,
        }
    }

    /// Waits for the next reply.
    ///
    /// Returns `None` once the window has closed or the collector is gone.
    pub async fn recv(&mut self) -> Option<Datagram> {
        tokio::time::timeout_at(self.deadline, self.rx.recv())
            .await
            .ok()
            .flatten()
    }

    /// Drains every reply until the window closes.
    pub async fn collect(mut self) -> Vec<Datagram> {
        let mut replies = Vec::new();
        while let Some(datagram) = self.recv().await {
            replies.push(datagram);
        }
        replies
    }
}

/// Sends and receives raw datagrams.
///
/// Implementations must be safe to share between tasks. Callers are expected
/// to serialize exchanges that share a reply stream.
pub trait Transport: Send + Sync + 'static {
    /// Sends `request` to `target` and waits for the first datagram that
    /// `accept` matches.
    ///
    /// Datagrams that do not match are discarded. The wait is bounded by
    /// `timeout` as a whole, not per datagram.
    ///
    /// # Errors
    ///
    /// Returns `Error::Timeout` if nothing acceptable arrives in time and
    /// `Error::Network` on socket failure.
    fn exchange<F>(
        &self,
        target: SocketAddr,
        request: &[u8],
        accept: F,
        timeout: Duration,
    ) -> impl Future<Output = Result<Datagram>> + Send
    where
        F: Fn(&[u8]) -> bool + Send + Sync;

    /// Sends `request` to `target` without waiting for a reply.
    ///
    /// # Errors
    ///
    /// Returns `Error::Network` on socket failure.
    fn send(&self, target: SocketAddr, request: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Broadcasts `request` on the local segment and collects replies for
    /// `window`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Network` if the broadcast cannot be sent.
    fn broadcast(
        &self,
        request: &[u8],
        window: Duration,
    ) -> impl Future<Output = Result<BroadcastReplies>> + Send;
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;

    fn datagram(n: u8) -> Datagram {
        Datagram {
            bytes: vec![n],
            from: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, n)), 20910),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn replies_stop_at_deadline() {
        let (tx, rx) = mpsc::channel(4);
        let mut replies = BroadcastReplies::from_channel(rx, Duration::from_secs(2));

        tx.send(datagram(1)).await.unwrap();
        assert_eq!(replies.recv().await, Some(datagram(1)));

        // Collector still alive but silent: the window closes the sequence.
        let started = Instant::now();
        assert_eq!(replies.recv().await, None);
        assert!(started.elapsed() <= Duration::from_secs(2));
        drop(tx);
    }

    #[tokio::test(start_paused = true)]
    async fn collect_ends_when_collector_finishes() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(datagram(1)).await.unwrap();
        tx.send(datagram(2)).await.unwrap();
        drop(tx);

        let replies = BroadcastReplies::from_channel(rx, Duration::from_secs(2));
        assert_eq!(replies.collect().await, vec![datagram(1), datagram(2)]);
    }
}
