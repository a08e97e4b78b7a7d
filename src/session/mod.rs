//! Upload session: drives one transfer through reset, ready, chunk transfer and commit.
//!
//! ```text
//! Idle -> Resetting -> ReadyWait -> Transferring(0..n) -> Committing -> Done
//!                 \__________________________________________/
//!                                    |
//!                                 Failed
//! ```
//!
//! A session is single-use. It owns its pre-encoded packets and borrows the
//! transport exclusively for the duration of [`UploadSession::run`], so at most
//! one write is ever outstanding. Chunk acknowledgments are awaited with a
//! bounded timeout; an expired wait is logged and the transfer moves on unless
//! strict acknowledgments are configured.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::codec::chunk::{self, Chunk};
use crate::codec::command::{build_ready, build_reset, build_upload_complete};
use crate::config::SessionConfig;
use crate::transport::{AckWait, Transport, WriteOutcome};
use crate::types::Packet;
use crate::{ProtocolError, Result};


/// Why a session stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    Transport,
    /// Only reachable with strict acknowledgments.
    AckTimeout { chunk: u16 },
    Cancelled,
}

/// Lifecycle position of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Resetting,
    ReadyWait,
    /// Writing chunk `cursor`.
    Transferring { cursor: u16 },
    Committing,
    Done,
    Failed(FailureReason),
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Done | Phase::Failed(_))
    }
}

/// Snapshot published on every phase change and after every chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadProgress {
    pub phase: Phase,
    /// Chunks whose acknowledgment wait has resolved.
    pub chunks_sent: usize,
    pub total: usize,
    /// Chunks whose acknowledgment wait expired.
    pub timeouts: usize,
}

/// Summary of a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub total_chunks: usize,
    pub acked: usize,
    /// Indices of chunks that were never acknowledged, in transfer order.
    pub timed_out: Vec<u16>,
    pub elapsed: Duration,
}

impl UploadReport {
    pub fn fully_acked(&self) -> bool {
        self.timed_out.is_empty()
    }
}

/// One transfer of an image container to the device.
pub struct UploadSession {
    chunks: Vec<(u16, Packet)>,
    config: SessionConfig,
    phase: Phase,
    acked: usize,
    timed_out: Vec<u16>,
    progress: watch::Sender<UploadProgress>,
}

impl UploadSession {
    /// Build a session from chunks already split from one container.
    ///
    /// The chunks must be complete and in order: chunk `i` has index `i` and
    /// every chunk carries the same total.
    pub fn new(chunks: Vec<Chunk>, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        if chunks.is_empty() {
            return Err(ProtocolError::EmptyPayload);
        }

        let total = chunks.len();
        for (position, chunk) in chunks.iter().enumerate() {
            if usize::from(chunk.index()) != position || usize::from(chunk.total()) != total {
                return Err(ProtocolError::invalid_parameter(
                    "chunks",
                    format!(
                        "chunk at position {} is {}/{}, expected {}/{}",
                        position,
                        chunk.index(),
                        chunk.total(),
                        position,
                        total
                    ),
                ));
            }
        }

        let chunks = chunks.iter().map(|c| (c.index(), c.encode())).collect();
        let (progress, _) = watch::channel(UploadProgress {
            phase: Phase::Idle,
            chunks_sent: 0,
            total,
            timeouts: 0,
        });

        Ok(Self { chunks, config, phase: Phase::Idle, acked: 0, timed_out: Vec::new(), progress })
    }

    /// Split `blob` and build a session for it.
    pub fn from_payload(blob: &[u8], config: SessionConfig) -> Result<Self> {
        Self::new(chunk::split(blob)?, config)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn total_chunks(&self) -> usize {
        self.chunks.len()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Watch receiver for progress snapshots.
    pub fn progress(&self) -> watch::Receiver<UploadProgress> {
        self.progress.subscribe()
    }

    /// Progress snapshots as a stream, starting with the current one.
    pub fn progress_updates(&self) -> WatchStream<UploadProgress> {
        WatchStream::new(self.progress.subscribe())
    }

    /// Drive the transfer to `Done`.
    ///
    /// Holds `transport` exclusively until the session ends. Cancelling the
    /// token abandons any pending write or wait; the device is left with a
    /// partial upload and the next session must start from Reset.
    pub async fn run<T>(
        &mut self,
        transport: &mut T,
        cancel: &CancellationToken,
    ) -> Result<UploadReport>
    where
        T: Transport + ?Sized,
    {
        if self.phase != Phase::Idle {
            return Err(ProtocolError::SessionState {
                expected: "Idle".to_string(),
                found: format!("{:?}", self.phase),
            });
        }

        let started = Instant::now();
        info!("Upload started: {} chunk(s)", self.chunks.len());

        match self.drive(transport, cancel).await {
            Ok(()) => {
                let report = UploadReport {
                    total_chunks: self.chunks.len(),
                    acked: self.acked,
                    timed_out: self.timed_out.clone(),
                    elapsed: started.elapsed(),
                };
                info!(
                    "Upload complete: {}/{} chunk(s) acknowledged in {:?}",
                    report.acked, report.total_chunks, report.elapsed
                );
                Ok(report)
            }
            Err(e) => {
                let reason = match &e {
                    ProtocolError::Cancelled => FailureReason::Cancelled,
                    ProtocolError::AckTimeout { chunk, .. } => {
                        FailureReason::AckTimeout { chunk: *chunk }
                    }
                    _ => FailureReason::Transport,
                };
                if reason == FailureReason::Cancelled {
                    info!("Upload cancelled in {:?}", self.phase);
                } else {
                    error!("Upload failed in {:?}: {}", self.phase, e);
                }
                self.enter(Phase::Failed(reason));
                Err(e)
            }
        }
    }

    async fn drive<T>(&mut self, transport: &mut T, cancel: &CancellationToken) -> Result<()>
    where
        T: Transport + ?Sized,
    {
        let settle = self.config.settle_delay;
        let ack_wait = AckWait::Within(self.config.ack_timeout);

        self.enter(Phase::Resetting);
        guarded(cancel, transport.write(&build_reset(), AckWait::None)).await?;
        settle_for(cancel, settle).await?;

        self.enter(Phase::ReadyWait);
        guarded(cancel, transport.write(&build_ready(), AckWait::None)).await?;
        settle_for(cancel, settle).await?;

        for position in 0..self.chunks.len() {
            let (index, packet) = &self.chunks[position];
            let index = *index;
            self.phase = Phase::Transferring { cursor: index };
            self.publish(position);
            trace!("Writing chunk {}/{}", index + 1, self.chunks.len());

            let outcome = guarded(cancel, transport.write(packet, ack_wait)).await?;
            match outcome {
                WriteOutcome::Acked => self.acked += 1,
                WriteOutcome::TimedOut => {
                    warn!(
                        "No acknowledgment for chunk {} within {:?}, continuing",
                        index, self.config.ack_timeout
                    );
                    self.timed_out.push(index);
                    if self.config.strict_acks {
                        return Err(ProtocolError::AckTimeout {
                            chunk: index,
                            timeout: self.config.ack_timeout,
                        });
                    }
                }
                // Transports without a notification path resolve immediately.
                WriteOutcome::Written => self.acked += 1,
            }
            self.publish(position + 1);
        }

        self.enter(Phase::Committing);
        let complete = build_upload_complete();
        for _ in 0..2 {
            guarded(cancel, transport.write(&complete, AckWait::None)).await?;
        }

        self.enter(Phase::Done);
        Ok(())
    }

    fn enter(&mut self, phase: Phase) {
        debug!("Upload phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
        let sent = self.progress.borrow().chunks_sent;
        self.publish(sent);
    }

    fn publish(&self, chunks_sent: usize) {
        self.progress.send_replace(UploadProgress {
            phase: self.phase,
            chunks_sent,
            total: self.chunks.len(),
            timeouts: self.timed_out.len(),
        });
    }
}

/// Run `step` unless `cancel` fires first.
async fn guarded<F, O>(cancel: &CancellationToken, step: F) -> Result<O>
where
    F: Future<Output = Result<O>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ProtocolError::Cancelled),
        result = step => result,
    }
}

async fn settle_for(cancel: &CancellationToken, delay: Duration) -> Result<()> {
    if delay.is_zero() {
        return if cancel.is_cancelled() { Err(ProtocolError::Cancelled) } else { Ok(()) };
    }
    guarded(cancel, async {
        tokio::time::sleep(delay).await;
        Ok(())
    })
    .await
}
