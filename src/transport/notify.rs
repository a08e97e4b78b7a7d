//! Transport built from a raw write half and a notification channel.
//!
//! Platform BLE stacks deliver notifications from a callback; the callback
//! side holds a [`NotificationSender`] and pushes every payload it sees on
//! the notify or Service Changed characteristic. The writing side is any
//! [`PacketSink`].

use std::io;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, trace};

use super::ack::{AckFuture, AckResult};
use super::{AckWait, Transport, WriteOutcome};
use crate::Result;
use crate::types::{Packet, hex};

const NOTIFICATION_CAPACITY: usize = 16;

/// Raw write half of a link, e.g. a GATT write-without-response characteristic.
#[async_trait::async_trait]
pub trait PacketSink: Send {
    async fn write_raw(&mut self, bytes: &[u8]) -> io::Result<()>;
}

/// Producer side of the notification channel.
#[derive(Debug, Clone)]
pub struct NotificationSender {
    tx: mpsc::Sender<Vec<u8>>,
}

impl NotificationSender {
    /// Forward one notification. Returns false when the buffer is full or
    /// the transport is gone; the notification is dropped in both cases.
    pub fn notify(&self, data: &[u8]) -> bool {
        self.tx.try_send(data.to_vec()).is_ok()
    }
}

/// [`Transport`] over a [`PacketSink`] that treats any notification as an acknowledgment.
pub struct NotifyTransport<S> {
    sink: S,
    notifications: mpsc::Receiver<Vec<u8>>,
    write_delay: Duration,
    last_notification: Option<Vec<u8>>,
}

impl<S: PacketSink> NotifyTransport<S> {
    /// Wrap `sink`. Writes that do not wait for an answer are followed by
    /// `write_delay` so the device is not flooded.
    pub fn new(sink: S, write_delay: Duration) -> (Self, NotificationSender) {
        let (tx, rx) = mpsc::channel(NOTIFICATION_CAPACITY);
        let transport =
            Self { sink, notifications: rx, write_delay, last_notification: None };
        (transport, NotificationSender { tx })
    }

    /// Payload of the most recent acknowledgment.
    pub fn last_notification(&self) -> Option<&[u8]> {
        self.last_notification.as_deref()
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn drain_stale(&mut self) {
        let mut dropped = 0usize;
        while let Ok(data) = self.notifications.try_recv() {
            trace!("Discarding stale notification {}", hex(&data));
            dropped += 1;
        }
        if dropped > 0 {
            debug!("Discarded {} stale notifications before write", dropped);
        }
    }
}

#[async_trait::async_trait]
impl<S: PacketSink> Transport for NotifyTransport<S> {
    async fn write(&mut self, packet: &Packet, ack: AckWait) -> Result<WriteOutcome> {
        self.drain_stale();

        debug!("TX {} bytes: {}", packet.len(), packet);
        self.sink.write_raw(packet.as_bytes()).await?;

        match ack {
            AckWait::None => {
                if !self.write_delay.is_zero() {
                    tokio::time::sleep(self.write_delay).await;
                }
                Ok(WriteOutcome::Written)
            }
            AckWait::Within(timeout) => {
                match AckFuture::new(&mut self.notifications, timeout).await {
                    AckResult::Acked(data) => {
                        debug!("RX {}", hex(&data));
                        self.last_notification = Some(data);
                        Ok(WriteOutcome::Acked)
                    }
                    AckResult::TimedOut => Ok(WriteOutcome::TimedOut),
                }
            }
        }
    }
}
