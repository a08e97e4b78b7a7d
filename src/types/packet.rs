//! Immutable link-layer packets

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Every YS-protocol packet starts with these four bytes.
pub const MAGIC_HEADER: [u8; 4] = [0xAA, 0x55, 0xFF, 0xFF];

/// One complete link-layer write.
///
/// Packets are immutable once built and cheap to clone (shared via `Arc`),
/// so the same `UploadComplete` packet can be queued twice without copying.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Packet {
    bytes: Arc<[u8]>,
}

impl Packet {
    /// Wrap finished packet bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes: bytes.into() }
    }

    /// Raw bytes as written to the link.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Whether the packet carries the YS magic header.
    pub fn has_magic(&self) -> bool {
        self.bytes.starts_with(&MAGIC_HEADER)
    }

    /// Uppercase hex dump, the format used in captures and logs.
    pub fn to_hex(&self) -> String {
        hex(&self.bytes)
    }
}

/// Uppercase hex rendering of raw bytes.
pub fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{:02X}", b);
    }
    out
}

impl Deref for Packet {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsRef<[u8]> for Packet {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<Vec<u8>> for Packet {
    fn from(bytes: Vec<u8>) -> Self {
        Packet::new(bytes)
    }
}

impl From<&[u8]> for Packet {
    fn from(bytes: &[u8]) -> Self {
        Self { bytes: bytes.into() }
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Packet[{}]({})", self.bytes.len(), self.to_hex())
    }
}
