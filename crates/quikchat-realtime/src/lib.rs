//! # quikchat-realtime
//!
//! Real-time delivery core for QuikChat. Provides:
//!
//! - The hub: one coordinator task owning the online-connection map
//! - Per-connection read and write pumps with heartbeat
//! - Chat message fan-out with persist-before-deliver and sender acks
//! - Friend and group notifications on a bounded worker pool
//! - Engine metrics

pub mod connection;
pub mod hub;
pub mod message;
pub mod metrics;
pub mod notification;
pub mod server;

#[cfg(test)]
pub(crate) mod testkit;

pub use connection::{ClientHandle, Frame};
pub use hub::{DeliveryOutcome, DispatchOutcome, Hub};
pub use metrics::{MetricsSnapshot, RealtimeMetrics};
pub use notification::{Notification, NotificationDispatcher};
pub use server::RealtimeEngine;
