// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Background polling for hosts that do not schedule polls themselves.
//!
//! The loop sleeps for [`DeviceSession::next_poll_delay`] and then calls
//! [`DeviceSession::poll`], so the interval follows the backoff of the
//! session's poll policy. Results reach the host through subscriptions.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use hpa4911_lib::DeviceSession;
//! use hpa4911_lib::session::poller;
//!
//! # async fn example() -> hpa4911_lib::Result<()> {
//! let session = Arc::new(
//!     DeviceSession::builder("A4:CF:12:00:9B:01".parse()?)
//!         .build_udp()
//!         .await?,
//! );
//!
//! let handle = poller::spawn(Arc::clone(&session));
//! // ...
//! handle.shutdown().await;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::protocol::Transport;
use crate::session::DeviceSession;

/// Polls `session` until `shutdown` becomes `true` or its sender is dropped.
///
/// Poll errors are already logged and counted by the session; the loop
/// keeps going.
pub async fn run_poller<T: Transport>(
    session: Arc<DeviceSession<T>>,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::debug!(session = %session.id(), "Poller started");
    loop {
        if *shutdown.borrow() {
            break;
        }
        let delay = session.next_poll_delay();
        tokio::select! {
            () = tokio::time::sleep(delay) => {
                if let Err(e) = session.poll().await {
                    tracing::debug!(session = %session.id(), error = %e, "Poll failed");
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    tracing::debug!(session = %session.id(), "Poller stopped");
}

/// Handle to a poller started with [`spawn`].
#[derive(Debug)]
pub struct PollerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Returns `true` once the poll loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the poller and waits for an in-flight poll to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Poller task ended abnormally");
        }
    }
}

/// Starts [`run_poller`] on the current runtime.
#[must_use]
pub fn spawn<T: Transport>(session: Arc<DeviceSession<T>>) -> PollerHandle {
    let (shutdown, rx) = watch::channel(false);
    let task = tokio::spawn(run_poller(session, rx));
    PollerHandle { shutdown, task }
}
