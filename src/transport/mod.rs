//! Transport boundary between the session and the wireless link.
//!
//! The session only needs one capability: write a packet and, optionally,
//! wait a bounded time for the device to answer it. Connection setup,
//! discovery and characteristic subscription live outside this crate.
//!
//! `write` takes `&mut self`, so a transport can never have two writes in
//! flight: the borrow checker serializes them.

mod ack;
mod notify;

pub use ack::{AckFuture, AckResult};
pub use notify::{NotificationSender, NotifyTransport, PacketSink};

use std::time::Duration;

use crate::Result;
use crate::types::Packet;

/// GATT identifiers of the backpack's vendor service.
pub mod gatt {
    /// Vendor service.
    pub const SERVICE_UUID: &str = "0000fff0-0000-1000-8000-00805f9b34fb";

    /// Write characteristic (write without response).
    pub const WRITE_CHAR_UUID: &str = "0000fff2-0000-1000-8000-00805f9b34fb";

    /// Notify characteristic carrying acknowledgments.
    pub const NOTIFY_CHAR_UUID: &str = "0000fff1-0000-1000-8000-00805f9b34fb";

    /// Standard Service Changed characteristic; some firmware acknowledges through it.
    pub const SERVICE_CHANGED_UUID: &str = "00002a05-0000-1000-8000-00805f9b34fb";
}

/// Whether a write should wait for the device to answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckWait {
    /// Fire and forget.
    None,
    /// Wait up to this long for a notification.
    Within(Duration),
}

/// How a successful write resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Written without waiting for an answer.
    Written,
    /// The device answered within the wait.
    Acked,
    /// The wait expired without an answer.
    TimedOut,
}

/// A full-duplex link with at most one outstanding request.
///
/// Errors from `write` mean the packet may not have reached the device;
/// an expired acknowledgment wait is not an error and is reported as
/// [`WriteOutcome::TimedOut`].
#[async_trait::async_trait]
pub trait Transport: Send {
    async fn write(&mut self, packet: &Packet, ack: AckWait) -> Result<WriteOutcome>;
}

#[async_trait::async_trait]
impl<T: Transport + ?Sized> Transport for &mut T {
    async fn write(&mut self, packet: &Packet, ack: AckWait) -> Result<WriteOutcome> {
        (**self).write(packet, ack).await
    }
}

#[async_trait::async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn write(&mut self, packet: &Packet, ack: AckWait) -> Result<WriteOutcome> {
        (**self).write(packet, ack).await
    }
}
