//! Scripted in-memory transport for tests and benchmarks
//!
//! [`RecordingTransport`] records every write with its acknowledgment policy
//! and answers acknowledgment waits from a script, so session behavior can be
//! checked without a device.

#![cfg(any(test, feature = "benchmark"))]

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

use crate::codec::ChunkHeader;
use crate::transport::{AckWait, Transport, WriteOutcome};
use crate::types::Packet;
use crate::{ProtocolError, Result};

/// Scripted answer to one acknowledgment wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Acknowledge after the configured latency.
    Ack,
    /// Stay silent until the wait expires.
    Silence,
}

/// One write as seen by the transport.
#[derive(Debug, Clone)]
pub struct RecordedWrite {
    pub packet: Packet,
    pub ack: AckWait,
    pub at: Instant,
}

/// Transport stub that records writes and checks they never overlap.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    writes: Vec<RecordedWrite>,
    replies: VecDeque<Reply>,
    fail_on_write: Option<usize>,
    ack_latency: Duration,
    in_flight: bool,
    overlaps: usize,
}

impl RecordingTransport {
    /// Acknowledges every wait immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer acknowledgment waits in order; waits beyond the script are acknowledged.
    pub fn with_replies<I: IntoIterator<Item = Reply>>(mut self, replies: I) -> Self {
        self.replies = replies.into_iter().collect();
        self
    }

    /// Fail the write with this zero-based position.
    pub fn failing_on_write(mut self, position: usize) -> Self {
        self.fail_on_write = Some(position);
        self
    }

    pub fn with_ack_latency(mut self, latency: Duration) -> Self {
        self.ack_latency = latency;
        self
    }

    pub fn writes(&self) -> &[RecordedWrite] {
        &self.writes
    }

    pub fn packets(&self) -> Vec<Packet> {
        self.writes.iter().map(|w| w.packet.clone()).collect()
    }

    /// Indices of recorded chunk packets, in write order.
    pub fn chunk_indices(&self) -> Vec<u16> {
        self.writes.iter().filter_map(|w| ChunkHeader::parse(&w.packet)).map(|h| h.index).collect()
    }

    /// Number of writes that started while another was still in flight.
    pub fn overlaps(&self) -> usize {
        self.overlaps
    }
}

#[async_trait::async_trait]
impl Transport for RecordingTransport {
    async fn write(&mut self, packet: &Packet, ack: AckWait) -> Result<WriteOutcome> {
        if self.in_flight {
            self.overlaps += 1;
        }
        let _in_flight = InFlight::enter(&mut self.in_flight);

        let position = self.writes.len();
        self.writes.push(RecordedWrite { packet: packet.clone(), ack, at: Instant::now() });

        if self.fail_on_write == Some(position) {
            return Err(ProtocolError::transport_failed(format!("scripted failure on write {}", position)));
        }

        let outcome = match ack {
            AckWait::None => WriteOutcome::Written,
            AckWait::Within(timeout) => match self.replies.pop_front().unwrap_or(Reply::Ack) {
                Reply::Ack if self.ack_latency < timeout => {
                    if !self.ack_latency.is_zero() {
                        tokio::time::sleep(self.ack_latency).await;
                    }
                    WriteOutcome::Acked
                }
                Reply::Ack | Reply::Silence => {
                    tokio::time::sleep(timeout).await;
                    WriteOutcome::TimedOut
                }
            },
        };

        Ok(outcome)
    }
}

/// Clears the in-flight flag when the write finishes or its future is dropped.
struct InFlight<'a>(&'a mut bool);

impl<'a> InFlight<'a> {
    fn enter(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}
