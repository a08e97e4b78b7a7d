//! Fixed command packets: reset, ready, upload-complete and brightness.
//!
//! The first three are literal captures from the companion app and are
//! never recomputed. Brightness carries one parameter byte and a checksum
//! byte that follows a device-specific offset rather than the generic sum.

use tracing::trace;

use crate::types::Packet;
use crate::{ProtocolError, Result};

/// Clear stored media and reset the upload state.
pub const RESET_PACKET: [u8; 16] = [
    0xAA, 0x55, 0xFF, 0xFF, 0x0A, 0x00, 0x09, 0x00, 0xC1, 0x02, 0x08, 0x02, 0x00, 0xFF, 0xDC, 0x04,
];

/// Announce an upload.
pub const READY_PACKET: [u8; 16] = [
    0xAA, 0x55, 0xFF, 0xFF, 0x0A, 0x00, 0x09, 0x00, 0xC1, 0x02, 0x08, 0x02, 0x00, 0x00, 0xDD, 0x03,
];

/// Commit the uploaded chunks. Sent twice at the end of every transfer.
pub const UPLOAD_COMPLETE_PACKET: [u8; 17] = [
    0xAA, 0x55, 0xFF, 0xFF, 0x0B, 0x00, 0x0F, 0x00, 0xC1, 0x02, 0x36, 0x03, 0x01, 0x00, 0x00, 0x14,
    0x04,
];

/// Number of distinct brightness levels (0 through 15).
pub const BRIGHTNESS_LEVELS: u8 = 16;

/// Empirical checksum base for the brightness packet. Do not derive it from
/// the generic trailer; the device only accepts this value.
const BRIGHTNESS_CHECKSUM_BASE: u8 = 0xD6;

const BRIGHTNESS_PREFIX: [u8; 12] =
    [0xAA, 0x55, 0xFF, 0xFF, 0x0A, 0x00, 0x04, 0x00, 0xC1, 0x02, 0x06, 0x02];

const BRIGHTNESS_TRAILER: u8 = 0x03;

/// The closed set of fixed commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Reset,
    Ready,
    UploadComplete,
    /// Device level 0-15.
    Brightness(u8),
}

impl Command {
    /// Brightness command from a 0-255 user level, scaled onto 0-15.
    pub fn brightness_scaled(level: u8) -> Self {
        Command::Brightness(scale_brightness(level))
    }

    /// Encode to wire bytes.
    pub fn encode(self) -> Result<Packet> {
        match self {
            Command::Reset => Ok(build_reset()),
            Command::Ready => Ok(build_ready()),
            Command::UploadComplete => Ok(build_upload_complete()),
            Command::Brightness(level) => build_brightness(level),
        }
    }

    /// Short name for logs.
    pub fn name(self) -> &'static str {
        match self {
            Command::Reset => "reset",
            Command::Ready => "ready",
            Command::UploadComplete => "upload-complete",
            Command::Brightness(_) => "brightness",
        }
    }
}

pub fn build_reset() -> Packet {
    Packet::from(&RESET_PACKET[..])
}

pub fn build_ready() -> Packet {
    Packet::from(&READY_PACKET[..])
}

pub fn build_upload_complete() -> Packet {
    Packet::from(&UPLOAD_COMPLETE_PACKET[..])
}

/// Build the 16-byte brightness packet for a device level in `0..=15`.
pub fn build_brightness(level: u8) -> Result<Packet> {
    if level >= BRIGHTNESS_LEVELS {
        return Err(ProtocolError::invalid_parameter(
            "brightness",
            format!("level {} is outside 0-{}", level, BRIGHTNESS_LEVELS - 1),
        ));
    }

    let mut bytes = Vec::with_capacity(16);
    bytes.extend_from_slice(&BRIGHTNESS_PREFIX);
    bytes.push(0x00);
    bytes.push(level);
    bytes.push(BRIGHTNESS_CHECKSUM_BASE.wrapping_add(level));
    bytes.push(BRIGHTNESS_TRAILER);

    trace!("Brightness level {} -> {} bytes", level, bytes.len());
    Ok(Packet::new(bytes))
}

/// Map a 0-255 level onto the device's 16 steps.
pub fn scale_brightness(level: u8) -> u8 {
    ((u16::from(level) * u16::from(BRIGHTNESS_LEVELS)) / 256) as u8
}
