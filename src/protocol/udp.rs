// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! UDP transport.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::{Mutex, mpsc};
use tokio::time::Instant;

use super::{BroadcastReplies, Datagram, Transport};
use crate::error::{Error, Result};

/// Largest datagram the protocol produces, with headroom.
pub const MAX_DATAGRAM_SIZE: usize = 512;

/// Replies buffered between the broadcast collector and its reader.
const BROADCAST_CHANNEL_CAPACITY: usize = 32;

/// UDP transport bound to a local port.
///
/// Unicast exchanges and broadcasts share one socket. An I/O lock keeps a
/// broadcast collection from stealing replies meant for an exchange: while
/// a [`BroadcastReplies`] is alive and its window open, exchanges wait.
/// Dropping it releases the socket at once.
///
/// # Examples
///
/// ```no_run
/// use std::net::SocketAddr;
/// use hpa4911_lib::protocol::UdpTransport;
///
/// # async fn example() -> hpa4911_lib::Result<()> {
/// let local: SocketAddr = "0.0.0.0:20911".parse().unwrap();
/// let broadcast: SocketAddr = "255.255.255.255:20910".parse().unwrap();
/// let transport = UdpTransport::bind(local, broadcast).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
    io_lock: Arc<Mutex<()>>,
    broadcast_target: SocketAddr,
}

impl UdpTransport {
    /// Binds the client socket and enables broadcast.
    ///
    /// # Errors
    ///
    /// Returns `Error::Network` if the port is unavailable.
    pub async fn bind(local: SocketAddr, broadcast_target: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(local).await?;
        socket.set_broadcast(true)?;
        tracing::debug!(
            local = %socket.local_addr()?,
            broadcast = %broadcast_target,
            "UDP transport bound"
        );
        Ok(Self {
            socket: Arc::new(socket),
            io_lock: Arc::new(Mutex::new(())),
            broadcast_target,
        })
    }

    /// Returns the bound local address.
    ///
    /// # Errors
    ///
    /// Returns `Error::Network` if the socket cannot report its address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Returns where broadcasts are sent.
    #[must_use]
    pub fn broadcast_target(&self) -> SocketAddr {
        self.broadcast_target
    }

    /// Discards datagrams that arrived after a previous exchange gave up.
    fn drain_stale(&self) -> Result<()> {
        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        loop {
            match self.socket.try_recv_from(&mut buf) {
                Ok((len, from)) => {
                    tracing::trace!(%from, len, "Discarding stale datagram");
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl Transport for UdpTransport {
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
        let _io = self.io_lock.lock().await;
        self.drain_stale()?;

        tracing::trace!(%target, len = request.len(), "Sending request");
        self.socket.send_to(request, target).await?;

        let deadline = Instant::now() + timeout;
        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        loop {
            let (len, from) = tokio::time::timeout_at(deadline, self.socket.recv_from(&mut buf))
                .await
                .map_err(|_| Error::timeout(timeout))??;
            let bytes = &buf[..len];
            if accept(bytes) {
                tracing::trace!(%from, len, "Received reply");
                return Ok(Datagram {
                    bytes: bytes.to_vec(),
                    from,
                });
            }
            tracing::trace!(%from, len, "Ignoring unrelated datagram");
        }
    }

    async fn send(&self, target: SocketAddr, request: &[u8]) -> Result<()> {
        let _io = self.io_lock.lock().await;
        self.socket.send_to(request, target).await?;
        Ok(())
    }

    async fn broadcast(&self, request: &[u8], window: Duration) -> Result<BroadcastReplies> {
        let io = Arc::clone(&self.io_lock).lock_owned().await;
        self.drain_stale()?;

        tracing::debug!(target = %self.broadcast_target, ?window, "Broadcasting");
        self.socket.send_to(request, self.broadcast_target).await?;

        let (tx, rx) = mpsc::channel(BROADCAST_CHANNEL_CAPACITY);
        let replies = BroadcastReplies::from_channel(rx, window);
        let socket = Arc::clone(&self.socket);
        let deadline = Instant::now() + window;

        tokio::spawn(async move {
            let _io = io;
            let mut buf = [0u8; MAX_DATAGRAM_SIZE];
            loop {
                let recv = tokio::time::timeout_at(deadline, socket.recv_from(&mut buf));
                let received = tokio::select! {
                    () = tx.closed() => {
                        tracing::trace!("Broadcast reader dropped");
                        break;
                    }
                    received = recv => received,
                };
                let (len, from) = match received {
                    Err(_) => break,
                    Ok(Err(e)) => {
                        tracing::warn!(error = %e, "Broadcast collection failed");
                        break;
                    }
                    Ok(Ok(received)) => received,
                };
                let datagram = Datagram {
                    bytes: buf[..len].to_vec(),
                    from,
                };
                if tx.send(datagram).await.is_err() {
                    break;
                }
            }
            tracing::trace!("Broadcast window closed");
        });

        Ok(replies)
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;

    fn loopback(port: u16) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
    }

    #[tokio::test]
    async fn exchange_skips_unaccepted_datagrams() {
        let peer = UdpSocket::bind(loopback(0)).await.unwrap();
        let peer_addr = peer.local_addr().unwrap();
        let transport = UdpTransport::bind(loopback(0), peer_addr).await.unwrap();

        let responder = tokio::spawn(async move {
            let mut buf = [0u8; 64];
            let (_, from) = peer.recv_from(&mut buf).await.unwrap();
            peer.send_to(b"noise", from).await.unwrap();
            peer.send_to(b"answer", from).await.unwrap();
        });

        let reply = transport
            .exchange(
                peer_addr,
                b"ping",
                |bytes| bytes == b"answer",
                Duration::from_secs(2),
            )
            .await
            .unwrap();
        assert_eq!(reply.bytes, b"answer");
        assert_eq!(reply.from, peer_addr);
        responder.await.unwrap();
    }

    #[tokio::test]
    async fn exchange_times_out() {
        let silent = UdpSocket::bind(loopback(0)).await.unwrap();
        let silent_addr = silent.local_addr().unwrap();
        let transport = UdpTransport::bind(loopback(0), silent_addr).await.unwrap();

        let err = transport
            .exchange(silent_addr, b"ping", |_| true, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout(50)));
    }

    #[tokio::test]
    async fn dropping_broadcast_replies_frees_the_socket() {
        let peer = UdpSocket::bind(loopback(0)).await.unwrap();
        let peer_addr = peer.local_addr().unwrap();
        let transport = UdpTransport::bind(loopback(0), peer_addr).await.unwrap();

        let responder = tokio::spawn(async move {
            let mut buf = [0u8; 64];
            for _ in 0..2 {
                let (_, from) = peer.recv_from(&mut buf).await.unwrap();
                peer.send_to(b"answer", from).await.unwrap();
            }
        });

        let mut replies = transport
            .broadcast(b"who", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(replies.recv().await.unwrap().bytes, b"answer");
        drop(replies);

        let started = Instant::now();
        transport
            .exchange(peer_addr, b"ping", |_| true, Duration::from_secs(2))
            .await
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(1));
        responder.await.unwrap();
    }
}
