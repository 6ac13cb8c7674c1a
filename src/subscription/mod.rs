// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Callback subscriptions for session notifications.
//!
//! - [`SubscriptionId`] - Identifier returned by every registration
//! - [`CallbackRegistry`] - Stores callbacks and dispatches notifications
//! - [`Subscribable`] - Implemented by [`DeviceSession`](crate::DeviceSession)
//!
//! Three kinds of notification exist: a new status record, each field that
//! changed, and availability transitions.

mod callback;
mod subscribable;

pub use callback::{CallbackRegistry, SubscriptionId};
pub use subscribable::Subscribable;
