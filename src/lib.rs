//! Codec and upload session for YS-protocol LED matrix panels.
//!
//! `ysled` speaks the reverse-engineered binary protocol of small wireless
//! LED backpacks and signs: fixed command packets, checksummed chunked image
//! uploads and immediate drawing primitives, plus the session that drives a
//! device through reset, ready, transfer and commit over an unreliable
//! acknowledgment channel.
//!
//! # Features
//!
//! - **Pure codecs**: every encoder validates first and never emits a partial packet
//! - **One write in flight**: the session borrows the transport exclusively
//! - **Lenient acknowledgments**: missed acks are logged, strict mode is opt-in
//! - **Transport agnostic**: bring any link through [`Transport`] or [`PacketSink`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use ysled::{DrawCommand, LedClient, NotifyTransport, PacketSink, Rgb, SessionConfig};
//!
//! struct GattWriter;
//!
//! #[async_trait::async_trait]
//! impl PacketSink for GattWriter {
//!     async fn write_raw(&mut self, _bytes: &[u8]) -> std::io::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> ysled::Result<()> {
//!     let config = SessionConfig::default();
//!     let (transport, notifications) = NotifyTransport::new(GattWriter, config.write_delay);
//!     // Hand `notifications` to the BLE notify callback.
//!     let _ = notifications.notify(&[0x00]);
//!
//!     let mut client = LedClient::new(transport, config);
//!     let report = client.upload(b"GIF89a...", &CancellationToken::new()).await?;
//!     println!("{} of {} chunks acknowledged", report.acked, report.total_chunks);
//!
//!     client.enter_draw_mode().await?;
//!     client.draw(&DrawCommand::FillRect { x0: 0, y0: 0, x1: 31, y1: 31, color: Rgb::RED }).await?;
//!     tokio::time::sleep(Duration::from_secs(1)).await;
//!     client.clear_screen().await
//! }
//! ```

// Core types and error handling
pub mod checksum;
mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Packet codecs
pub mod codec;

// Device interaction
pub mod client;
pub mod config;
pub mod session;
pub mod transport;

// Core exports
pub use error::*;
pub use types::*;

pub use codec::{BitMatrix, Chunk, ChunkHeader, Command, DrawCommand};
pub use config::SessionConfig;

// Main API exports
pub use client::LedClient;
pub use session::{FailureReason, Phase, UploadProgress, UploadReport, UploadSession};
pub use transport::{AckWait, NotificationSender, NotifyTransport, PacketSink, Transport, WriteOutcome};
