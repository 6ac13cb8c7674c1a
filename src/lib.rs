// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `hpa4911_lib` - A Rust library to control BGH HPA-4911 HVAC bridges.
//!
//! The bridges speak a small binary protocol over local UDP. This library
//! finds a bridge from its MAC, exchanges status and command packets with it
//! and keeps a normalized climate model up to date, without any cloud
//! service.
//!
//! # Layers
//!
//! - [`types`] and [`command`] / [`response`]: the packet codec
//! - [`protocol`]: the [`Transport`](protocol::Transport) trait and its UDP
//!   implementation
//! - [`discovery`]: MAC to IP resolution and segment-wide discovery
//! - [`session`]: [`DeviceSession`], the serialized request path with retry,
//!   failure counting and poll backoff
//! - [`climate`]: the host-facing climate entity
//!
//! # Quick Start
//!
//! ```no_run
//! use hpa4911_lib::DeviceSession;
//! use hpa4911_lib::command::PartialCommand;
//! use hpa4911_lib::types::{FanSpeed, HvacMode, TargetTemperature};
//!
//! #[tokio::main]
//! async fn main() -> hpa4911_lib::Result<()> {
//!     let session = DeviceSession::builder("A4:CF:12:00:9B:01".parse()?)
//!         .with_ip("192.168.1.40".parse().unwrap())
//!         .build_udp()
//!         .await?;
//!
//!     let status = session.refresh().await?;
//!     println!("{} at {} °C", status.mode(), status.current_temperature());
//!
//!     let status = session
//!         .apply(
//!             PartialCommand::new()
//!                 .mode(HvacMode::Cool)
//!                 .fan_speed(FanSpeed::Low)
//!                 .target_temperature(TargetTemperature::new(23)?),
//!         )
//!         .await?;
//!     assert_eq!(status.mode(), HvacMode::Cool);
//!     Ok(())
//! }
//! ```
//!
//! ## Polling and Callbacks
//!
//! ```no_run
//! use std::sync::Arc;
//! use hpa4911_lib::{DeviceSession, poller};
//! use hpa4911_lib::subscription::Subscribable;
//!
//! #[tokio::main]
//! async fn main() -> hpa4911_lib::Result<()> {
//!     let session = Arc::new(
//!         DeviceSession::builder("A4:CF:12:00:9B:01".parse()?)
//!             .build_udp()
//!             .await?,
//!     );
//!
//!     session.on_change(|change| println!("changed: {change:?}"));
//!     session.on_availability(|available| println!("available: {available}"));
//!
//!     let handle = poller::spawn(Arc::clone(&session));
//!     tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
//!     handle.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod climate;
pub mod command;
pub mod config;
pub mod discovery;
pub mod error;
pub mod protocol;
pub mod response;
pub mod session;
pub mod state;
pub mod subscription;
pub mod types;

pub use climate::{ClimateEntity, ClimateState, HvacAction};
pub use command::{CommandFrame, PartialCommand};
pub use config::{DeviceConfig, PollPolicy, SessionOptions};
pub use discovery::{DiscoveredDevice, Resolver};
pub use error::{Error, PacketError, Result, ValueError};
pub use protocol::{Transport, UdpTransport};
pub use response::{BatteryStatus, DeviceInfo, StatusRecord};
pub use session::{DeviceSession, DeviceSessionBuilder, SessionId, poller};
pub use state::{DeviceSessionState, SessionPhase, StatusChange};
pub use subscription::{CallbackRegistry, Subscribable, SubscriptionId};
pub use types::{DeviceAddress, FanSpeed, HvacMode, MacAddress, PowerState, TargetTemperature};
