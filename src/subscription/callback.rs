// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Callback management for session notifications.
//!
//! - [`SubscriptionId`] - Unique identifier for unsubscribing
//! - [`CallbackRegistry`] - Registry for storing and dispatching callbacks

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::response::StatusRecord;
use crate::state::StatusChange;

/// Unique identifier for a subscription.
///
/// Returned when registering a callback; IDs are unique within a session's
/// lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Creates a subscription ID with the given value.
    #[must_use]
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

type StatusCallback = Arc<dyn Fn(&StatusRecord) + Send + Sync>;

type ChangeCallback = Arc<dyn Fn(&StatusChange) + Send + Sync>;

type AvailabilityCallback = Arc<dyn Fn(bool) + Send + Sync>;

/// Registry for session callbacks.
///
/// Callbacks are stored behind `parking_lot::RwLock`s and wrapped in `Arc`.
/// Dispatch clones the callback list before invoking anything, so a
/// callback may itself subscribe or unsubscribe.
pub struct CallbackRegistry {
    next_id: AtomicU64,
    status_callbacks: RwLock<HashMap<SubscriptionId, StatusCallback>>,
    change_callbacks: RwLock<HashMap<SubscriptionId, ChangeCallback>>,
    availability_callbacks: RwLock<HashMap<SubscriptionId, AvailabilityCallback>>,
}

impl CallbackRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            status_callbacks: RwLock::new(HashMap::new()),
            change_callbacks: RwLock::new(HashMap::new()),
            availability_callbacks: RwLock::new(HashMap::new()),
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers a callback for every successfully decoded status.
    pub fn on_status<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&StatusRecord) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.status_callbacks.write().insert(id, Arc::new(callback));
        id
    }

    /// Registers a callback for each field that changed.
    pub fn on_change<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&StatusChange) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.change_callbacks.write().insert(id, Arc::new(callback));
        id
    }

    /// Registers a callback for availability transitions.
    ///
    /// The callback receives `true` when the device comes back and `false`
    /// when it becomes unavailable.
    pub fn on_availability<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.availability_callbacks
            .write()
            .insert(id, Arc::new(callback));
        id
    }

    /// Unregisters a callback.
    ///
    /// Returns `true` if a callback was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.status_callbacks.write().remove(&id).is_some()
            || self.change_callbacks.write().remove(&id).is_some()
            || self.availability_callbacks.write().remove(&id).is_some()
    }

    /// Removes every callback.
    pub fn clear(&self) {
        self.status_callbacks.write().clear();
        self.change_callbacks.write().clear();
        self.availability_callbacks.write().clear();
    }

    /// Notifies status subscribers, then change subscribers once per change.
    pub fn dispatch_status(&self, status: &StatusRecord, changes: &[StatusChange]) {
        let callbacks: Vec<_> = self.status_callbacks.read().values().cloned().collect();
        for callback in callbacks {
            callback(status);
        }

        if changes.is_empty() {
            return;
        }
        let callbacks: Vec<_> = self.change_callbacks.read().values().cloned().collect();
        for change in changes {
            for callback in &callbacks {
                callback(change);
            }
        }
    }

    /// Notifies availability subscribers.
    pub fn dispatch_availability(&self, available: bool) {
        let callbacks: Vec<_> = self
            .availability_callbacks
            .read()
            .values()
            .cloned()
            .collect();
        for callback in callbacks {
            callback(available);
        }
    }

    /// Returns the total number of registered callbacks.
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.status_callbacks.read().len()
            + self.change_callbacks.read().len()
            + self.availability_callbacks.read().len()
    }

    /// Returns `true` if there are no registered callbacks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callback_count() == 0
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("callback_count", &self.callback_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;

    use parking_lot::Mutex;

    use super::*;
    use crate::command::CommandFrame;
    use crate::types::{FanSpeed, HvacMode};

    fn status() -> StatusRecord {
        StatusRecord::new(CommandFrame::default(), 21)
    }

    #[test]
    fn subscription_id_display() {
        assert_eq!(SubscriptionId::new(42).to_string(), "Sub(42)");
    }

    #[test]
    fn registry_new_is_empty() {
        let registry = CallbackRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.callback_count(), 0);
    }

    #[test]
    fn ids_are_unique() {
        let registry = CallbackRegistry::new();
        let a = registry.on_status(|_| {});
        let b = registry.on_change(|_| {});
        let c = registry.on_availability(|_| {});
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_eq!(registry.callback_count(), 3);
    }

    #[test]
    fn status_callback_and_unsubscribe() {
        let registry = CallbackRegistry::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let id = registry.on_status(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        registry.dispatch_status(&status(), &[]);
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        assert!(registry.unsubscribe(id));
        assert!(!registry.unsubscribe(id));
        registry.dispatch_status(&status(), &[]);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn change_callbacks_receive_each_change() {
        let registry = CallbackRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        registry.on_change(move |change| seen_clone.lock().push(*change));

        let changes = [
            StatusChange::Mode(HvacMode::Heat),
            StatusChange::FanSpeed(FanSpeed::Low),
        ];
        registry.dispatch_status(&status(), &changes);
        assert_eq!(*seen.lock(), changes.to_vec());
    }

    #[test]
    fn availability_callbacks() {
        let registry = CallbackRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        registry.on_availability(move |available| seen_clone.lock().push(available));

        registry.dispatch_availability(false);
        registry.dispatch_availability(true);
        assert_eq!(*seen.lock(), vec![false, true]);
    }

    #[test]
    fn clear_removes_everything() {
        let registry = CallbackRegistry::new();
        registry.on_status(|_| {});
        registry.on_availability(|_| {});
        registry.clear();
        assert!(registry.is_empty());
    }
}
