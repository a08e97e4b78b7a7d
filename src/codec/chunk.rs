//! Chunked transfer of an opaque image container.
//!
//! The container (a GIF rendered elsewhere) is cut into 196-byte windows.
//! Each window becomes one 243-byte packet:
//!
//! ```text
//! offset  size  field
//!      0     4  magic AA 55 FF FF
//!      4     1  length (payload + 41)
//!      5     3  chunk index (hi, lo, 00)
//!      8    27  constant command header
//!     35     1  total chunk count
//!     36     3  chunk index again
//!     39     4  constant C4 00 00 13
//!     43     2  payload length indicator 81 C4
//!     45   196  payload, zero padded
//!    241     2  checksum trailer over bytes 0..241
//! ```
//!
//! The device rejects larger windows, so the width is fixed.

use tracing::{debug, trace};

use crate::checksum::{append_trailer, verify_trailer};
use crate::codec::command::{build_ready, build_reset, build_upload_complete};
use crate::types::{MAGIC_HEADER, Packet};
use crate::{ProtocolError, Result};

/// Payload bytes carried by every chunk, after padding.
pub const CHUNK_PAYLOAD_SIZE: usize = 196;

/// The total-count field is one byte wide.
pub const MAX_CHUNKS: usize = 255;

/// Bytes before the payload.
pub const CHUNK_HEADER_SIZE: usize = 45;

/// Full packet size including the trailer.
pub const CHUNK_PACKET_SIZE: usize = CHUNK_HEADER_SIZE + CHUNK_PAYLOAD_SIZE + 2;

const LENGTH_OVERHEAD: usize = 41;

const COMMAND_HEADER: [u8; 27] = [
    0xC1, 0x02, 0x09, 0x01, 0x01, 0x0C, 0x01, 0x00, 0x0D, 0x01, 0x00, 0x0E, 0x01, 0x00, 0x14, 0x03,
    0x01, 0x09, 0x0A, 0x11, 0x04, 0x00, 0x01, 0x00, 0x0A, 0x12, 0x07,
];

const FIELD_CONSTANT: [u8; 4] = [0xC4, 0x00, 0x00, 0x13];

const PAYLOAD_LENGTH_INDICATOR: [u8; 2] = [0x81, 0xC4];

const INDEX_OFFSET: usize = 5;
const TOTAL_OFFSET: usize = 35;

/// One window of the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    index: u16,
    total: u16,
    payload: Vec<u8>,
}

impl Chunk {
    /// Create a chunk, enforcing `index < total <= 255` and the window width.
    pub fn new(index: u16, total: u16, payload: &[u8]) -> Result<Self> {
        if usize::from(total) > MAX_CHUNKS {
            return Err(ProtocolError::TooManyChunks { chunks: usize::from(total), max: MAX_CHUNKS });
        }
        if index >= total {
            return Err(ProtocolError::invalid_parameter(
                "chunk index",
                format!("index {} is not below total {}", index, total),
            ));
        }
        if payload.len() > CHUNK_PAYLOAD_SIZE {
            return Err(ProtocolError::invalid_parameter(
                "chunk payload",
                format!("{} bytes exceeds the {}-byte window", payload.len(), CHUNK_PAYLOAD_SIZE),
            ));
        }
        Ok(Self { index, total, payload: payload.to_vec() })
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn total(&self) -> u16 {
        self.total
    }

    /// Payload as supplied, before padding.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload right-padded with zeros to the full window.
    pub fn padded_payload(&self) -> [u8; CHUNK_PAYLOAD_SIZE] {
        let mut window = [0u8; CHUNK_PAYLOAD_SIZE];
        window[..self.payload.len()].copy_from_slice(&self.payload);
        window
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == self.total
    }

    /// Encode into a complete chunk packet.
    pub fn encode(&self) -> Packet {
        let index_field = index_field(self.index);

        let mut bytes = Vec::with_capacity(CHUNK_PACKET_SIZE);
        bytes.extend_from_slice(&MAGIC_HEADER);
        bytes.push((CHUNK_PAYLOAD_SIZE + LENGTH_OVERHEAD) as u8);
        bytes.extend_from_slice(&index_field);
        bytes.extend_from_slice(&COMMAND_HEADER);
        bytes.push(self.total as u8);
        bytes.extend_from_slice(&index_field);
        bytes.extend_from_slice(&FIELD_CONSTANT);
        bytes.extend_from_slice(&PAYLOAD_LENGTH_INDICATOR);
        debug_assert_eq!(bytes.len(), CHUNK_HEADER_SIZE);
        bytes.extend_from_slice(&self.padded_payload());
        append_trailer(&mut bytes);

        trace!("Encoded chunk {}/{} ({} payload bytes)", self.index + 1, self.total, self.payload.len());
        Packet::new(bytes)
    }
}

fn index_field(index: u16) -> [u8; 3] {
    let [hi, lo] = index.to_be_bytes();
    [hi, lo, 0x00]
}

/// Index and total read back from an encoded chunk packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub index: u16,
    pub total: u16,
}

impl ChunkHeader {
    /// Recognize a chunk packet by its layout and trailer.
    ///
    /// Returns `None` for command packets, draw packets, or corrupted chunks.
    pub fn parse(packet: &[u8]) -> Option<Self> {
        if packet.len() != CHUNK_PACKET_SIZE || !packet.starts_with(&MAGIC_HEADER) {
            return None;
        }
        if packet[8..35] != COMMAND_HEADER || !verify_trailer(packet) {
            return None;
        }
        let index = u16::from_be_bytes([packet[INDEX_OFFSET], packet[INDEX_OFFSET + 1]]);
        Some(Self { index, total: u16::from(packet[TOTAL_OFFSET]) })
    }
}

/// Number of chunks needed for a container of `len` bytes.
pub fn chunk_count(len: usize) -> usize {
    len.div_ceil(CHUNK_PAYLOAD_SIZE)
}

/// Partition a container into chunks.
///
/// Fails before producing anything when the container is empty or would need
/// more chunks than the one-byte total field can express.
pub fn split(blob: &[u8]) -> Result<Vec<Chunk>> {
    if blob.is_empty() {
        return Err(ProtocolError::EmptyPayload);
    }

    let count = chunk_count(blob.len());
    if count > MAX_CHUNKS {
        return Err(ProtocolError::TooManyChunks { chunks: count, max: MAX_CHUNKS });
    }

    let total = count as u16;
    blob.chunks(CHUNK_PAYLOAD_SIZE)
        .enumerate()
        .map(|(i, window)| Chunk::new(i as u16, total, window))
        .collect()
}

/// Full packet list for one upload:
/// `[Reset, Ready, chunk_0 .. chunk_n-1, UploadComplete, UploadComplete]`.
pub fn build_upload_packets(blob: &[u8]) -> Result<Vec<Packet>> {
    let chunks = split(blob)?;
    debug!("Container of {} bytes split into {} chunk(s)", blob.len(), chunks.len());

    let mut packets = Vec::with_capacity(chunks.len() + 4);
    packets.push(build_reset());
    packets.push(build_ready());
    packets.extend(chunks.iter().map(Chunk::encode));
    let complete = build_upload_complete();
    packets.push(complete.clone());
    packets.push(complete);
    Ok(packets)
}
