//! Caller-owned handle for one connected device.
//!
//! [`LedClient`] owns a [`Transport`] and the session timing. Each high-level
//! operation is a short, fixed write sequence; uploads run a fresh
//! [`UploadSession`] every time.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::codec::command::{Command, build_ready, build_reset, scale_brightness};
use crate::codec::control::{DRAWING_GAME_ID, build_game_mode, build_playback_stop};
use crate::codec::draw::DrawCommand;
use crate::config::SessionConfig;
use crate::session::{UploadReport, UploadSession};
use crate::transport::{AckWait, Transport, WriteOutcome};
use crate::types::{DisplayGeometry, Packet};
use crate::Result;

/// High-level device operations over a transport.
pub struct LedClient<T> {
    transport: T,
    config: SessionConfig,
    geometry: DisplayGeometry,
}

impl<T: Transport> LedClient<T> {
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self { transport, config, geometry: DisplayGeometry::default() }
    }

    pub fn with_geometry(mut self, geometry: DisplayGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn geometry(&self) -> DisplayGeometry {
        self.geometry
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Reset then Ready, each followed by the settle delay.
    pub async fn reset(&mut self) -> Result<()> {
        info!("Sending reset");
        self.send_settled(&build_reset()).await?;
        info!("Sending ready");
        self.send_settled(&build_ready()).await
    }

    /// Set the device brightness level (0-15).
    pub async fn set_brightness(&mut self, level: u8) -> Result<()> {
        let packet = Command::Brightness(level).encode()?;
        info!("Setting brightness level {}", level);
        self.transport.write(&packet, AckWait::None).await?;
        Ok(())
    }

    /// Set brightness from a 0-255 level.
    pub async fn set_brightness_scaled(&mut self, level: u8) -> Result<()> {
        debug!("Brightness {} maps to level {}", level, scale_brightness(level));
        self.set_brightness(scale_brightness(level)).await
    }

    /// Upload an encoded image container through a fresh session.
    pub async fn upload(&mut self, blob: &[u8], cancel: &CancellationToken) -> Result<UploadReport> {
        let mut session = UploadSession::from_payload(blob, self.config)?;
        info!("Uploading {} bytes in {} chunk(s)", blob.len(), session.total_chunks());
        session.run(&mut self.transport, cancel).await
    }

    /// Switch the panel from stored media to real-time drawing.
    pub async fn enter_draw_mode(&mut self) -> Result<()> {
        self.reset().await?;
        info!("Entering drawing mode");
        self.send_settled(&build_game_mode(DRAWING_GAME_ID)).await
    }

    pub async fn stop_playback(&mut self) -> Result<()> {
        info!("Stopping playback");
        self.transport.write(&build_playback_stop(0), AckWait::None).await?;
        Ok(())
    }

    /// Clamp `command` onto the panel and send it.
    ///
    /// Returns whether the device acknowledged the packet; without draw
    /// acknowledgments configured this is always `false`.
    pub async fn draw(&mut self, command: &DrawCommand) -> Result<bool> {
        let packet = command.fit_to(self.geometry)?.encode(0)?;
        debug!("Drawing {} ({} bytes)", command.kind(), packet.len());

        if self.config.draw_acks {
            let outcome =
                self.transport.write(&packet, AckWait::Within(self.config.ack_timeout)).await?;
            return Ok(outcome == WriteOutcome::Acked);
        }

        self.transport.write(&packet, AckWait::None).await?;
        pause(self.config.draw_pacing).await;
        Ok(false)
    }

    /// Fill the whole panel with black.
    pub async fn clear_screen(&mut self) -> Result<()> {
        self.draw(&DrawCommand::clear(self.geometry)).await.map(|_| ())
    }

    async fn send_settled(&mut self, packet: &Packet) -> Result<()> {
        self.transport.write(packet, AckWait::None).await?;
        pause(self.config.settle_delay).await;
        Ok(())
    }
}

async fn pause(delay: std::time::Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
