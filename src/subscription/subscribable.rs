// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscribable trait for types that publish session notifications.

use crate::response::StatusRecord;
use crate::state::StatusChange;
use crate::subscription::SubscriptionId;

/// Trait for types that notify subscribers about device state.
///
/// Notifications are delivered synchronously, on the task that completed the
/// exchange, after the new state has been stored.
///
/// # Examples
///
/// ```no_run
/// use hpa4911_lib::DeviceSession;
/// use hpa4911_lib::subscription::Subscribable;
///
/// # async fn example() -> hpa4911_lib::Result<()> {
/// let session = DeviceSession::builder("A4:CF:12:00:9B:01".parse()?)
///     .build_udp()
///     .await?;
///
/// let sub_id = session.on_status(|status| {
///     println!("{} at {}", status.mode(), status.current_temperature());
/// });
///
/// session.on_availability(|available| {
///     println!("available: {available}");
/// });
///
/// session.unsubscribe(sub_id);
/// # Ok(())
/// # }
/// ```
pub trait Subscribable {
    /// Subscribes to every successfully decoded status.
    fn on_status<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&StatusRecord) + Send + Sync + 'static;

    /// Subscribes to field-level changes.
    ///
    /// The first status of a session reports every field.
    fn on_change<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&StatusChange) + Send + Sync + 'static;

    /// Subscribes to availability transitions.
    fn on_availability<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static;

    /// Removes a subscription.
    ///
    /// Returns `true` if the subscription existed.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}
