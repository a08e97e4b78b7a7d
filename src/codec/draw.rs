//! Real-time draw commands.
//!
//! A draw command is a single self-contained packet that takes effect
//! immediately, without the reset/ready/commit bracketing of an upload.
//! The device must be in drawing mode first (see [`crate::codec::control`]).
//!
//! Envelope:
//!
//! ```text
//! AA 55 FF FF | len | seq_lo seq_hi | 00 | C1 | 02 | payload | sum_lo sum_hi
//! ```
//!
//! where `len` is the low byte of `payload + 6`. The payload is a TLV
//! record tagged `0x32` with a sub-type selecting rectangle fill or raw
//! bitmap. Coordinates are encoded verbatim; clamp them to the panel with
//! [`DrawCommand::fit_to`] before encoding.

use std::collections::BTreeSet;

use tracing::trace;

use crate::checksum::append_trailer;
use crate::types::{DisplayGeometry, MAGIC_HEADER, Packet, Rgb};
use crate::{ProtocolError, Result};

/// Command flag byte shared by the real-time commands.
pub const COMMAND_FLAGS: u8 = 0xC1;

/// Command byte identifying a real-time draw.
pub const RT_DRAW_COMMAND: u8 = 0x02;

const TLV_TAG: u8 = 0x32;
const FILL_RECT_LENGTH: u8 = 13;
const SUBTYPE_RAW_BITMAP: u8 = 0;
const SUBTYPE_RECT: u8 = 1;
const RECT_MODE_FILL: u8 = 0;

/// Sub-type, color and four coordinates precede the bitmap bits.
const BITMAP_FIXED_LEN: usize = 12;

/// Largest value the three-byte length field can carry.
pub const MAX_ENCODED_LENGTH: usize = (1 << 21) - 1;

/// A rectangular grid of on/off pixels, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMatrix {
    width: u16,
    height: u16,
    bits: Vec<bool>,
}

impl BitMatrix {
    /// All-off matrix.
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height, bits: vec![false; usize::from(width) * usize::from(height)] }
    }

    /// Build from rows; short rows and missing rows read as off, extra cells are ignored.
    pub fn from_rows<R: AsRef<[bool]>>(width: u16, height: u16, rows: &[R]) -> Self {
        let mut matrix = Self::new(width, height);
        for (y, row) in rows.iter().take(usize::from(height)).enumerate() {
            for (x, &on) in row.as_ref().iter().take(usize::from(width)).enumerate() {
                matrix.set(x as u16, y as u16, on);
            }
        }
        matrix
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Out-of-range reads are off.
    pub fn get(&self, x: u16, y: u16) -> bool {
        self.offset(x, y).is_some_and(|i| self.bits[i])
    }

    /// Out-of-range writes are ignored.
    pub fn set(&mut self, x: u16, y: u16, on: bool) {
        if let Some(i) = self.offset(x, y) {
            self.bits[i] = on;
        }
    }

    pub fn count_on(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Bytes per packed row, `ceil(width / 8)`.
    pub fn bytes_per_row(&self) -> usize {
        usize::from(self.width).div_ceil(8)
    }

    /// One bit per pixel, MSB first, row-major; each row ends on a byte boundary.
    pub fn pack(&self) -> Vec<u8> {
        let row_bytes = self.bytes_per_row();
        let mut out = vec![0u8; row_bytes * usize::from(self.height)];
        for y in 0..usize::from(self.height) {
            for x in 0..usize::from(self.width) {
                if self.bits[y * usize::from(self.width) + x] {
                    out[y * row_bytes + x / 8] |= 0x80 >> (x % 8);
                }
            }
        }
        out
    }

    /// Sub-matrix starting at (`x`, `y`); cells beyond this matrix read as off.
    pub fn crop(&self, x: u16, y: u16, width: u16, height: u16) -> Self {
        let mut out = Self::new(width, height);
        for dy in 0..height {
            for dx in 0..width {
                if self.get(x.saturating_add(dx), y.saturating_add(dy)) {
                    out.set(dx, dy, true);
                }
            }
        }
        out
    }

    fn offset(&self, x: u16, y: u16) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| usize::from(y) * usize::from(self.width) + usize::from(x))
    }
}

/// One immediate drawing primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawCommand {
    /// Solid rectangle with inclusive corners.
    FillRect { x0: u16, y0: u16, x1: u16, y1: u16, color: Rgb },
    /// 1-bit bitmap whose top-left corner sits at (`x0`, `y0`).
    Bitmap { x0: u16, y0: u16, bitmap: BitMatrix, color: Rgb },
    /// Individual pixels, sent as a bitmap over their bounding box.
    Pixels { points: BTreeSet<(u16, u16)>, color: Rgb },
}

impl DrawCommand {
    /// Black rectangle over the whole panel.
    pub fn clear(geometry: DisplayGeometry) -> Self {
        DrawCommand::FillRect {
            x0: 0,
            y0: 0,
            x1: geometry.max_x(),
            y1: geometry.max_y(),
            color: Rgb::BLACK,
        }
    }

    pub fn pixels<I: IntoIterator<Item = (u16, u16)>>(points: I, color: Rgb) -> Self {
        DrawCommand::Pixels { points: points.into_iter().collect(), color }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DrawCommand::FillRect { .. } => "fill-rect",
            DrawCommand::Bitmap { .. } => "bitmap",
            DrawCommand::Pixels { .. } => "pixels",
        }
    }

    /// Clamp the command onto the panel.
    ///
    /// Rectangles have both corners clamped, bitmaps are cropped at the
    /// panel edge and off-panel pixels are dropped. A bitmap or point set
    /// that lies entirely off the panel is an error.
    pub fn fit_to(&self, geometry: DisplayGeometry) -> Result<Self> {
        match self {
            DrawCommand::FillRect { x0, y0, x1, y1, color } => {
                let (x0, y0, x1, y1) = geometry.clamp_rect(*x0, *y0, *x1, *y1);
                Ok(DrawCommand::FillRect { x0, y0, x1, y1, color: *color })
            }
            DrawCommand::Bitmap { x0, y0, bitmap, color } => {
                if !geometry.contains(*x0, *y0) {
                    return Err(ProtocolError::invalid_parameter(
                        "bitmap origin",
                        format!("({}, {}) is off a {}x{} panel", x0, y0, geometry.width, geometry.height),
                    ));
                }
                let width = bitmap.width().min(geometry.width - x0);
                let height = bitmap.height().min(geometry.height - y0);
                Ok(DrawCommand::Bitmap {
                    x0: *x0,
                    y0: *y0,
                    bitmap: bitmap.crop(0, 0, width, height),
                    color: *color,
                })
            }
            DrawCommand::Pixels { points, color } => {
                let kept: BTreeSet<_> =
                    points.iter().copied().filter(|&(x, y)| geometry.contains(x, y)).collect();
                if kept.is_empty() {
                    return Err(ProtocolError::EmptyPointSet);
                }
                Ok(DrawCommand::Pixels { points: kept, color: *color })
            }
        }
    }

    /// Encode into one real-time draw packet.
    pub fn encode(&self, sequence: u16) -> Result<Packet> {
        let payload = match self {
            DrawCommand::FillRect { x0, y0, x1, y1, color } => {
                fill_rect_payload(*x0, *y0, *x1, *y1, *color)?
            }
            DrawCommand::Bitmap { x0, y0, bitmap, color } => {
                bitmap_payload(*x0, *y0, bitmap, *color)?
            }
            DrawCommand::Pixels { points, color } => pixels_payload(points, *color)?,
        };
        trace!("{} payload: {} bytes", self.kind(), payload.len());
        Ok(frame_realtime(RT_DRAW_COMMAND, &payload, sequence))
    }
}

fn fill_rect_payload(x0: u16, y0: u16, x1: u16, y1: u16, color: Rgb) -> Result<Vec<u8>> {
    if x0 > x1 || y0 > y1 {
        return Err(ProtocolError::invalid_parameter(
            "rectangle",
            format!("corners ({}, {}) and ({}, {}) are not ordered", x0, y0, x1, y1),
        ));
    }

    let mut payload = Vec::with_capacity(15);
    payload.extend_from_slice(&[TLV_TAG, FILL_RECT_LENGTH, SUBTYPE_RECT]);
    payload.extend_from_slice(&color.to_bytes());
    payload.push(RECT_MODE_FILL);
    push_coords(&mut payload, x0, y0, x1, y1);
    Ok(payload)
}

fn bitmap_payload(x0: u16, y0: u16, bitmap: &BitMatrix, color: Rgb) -> Result<Vec<u8>> {
    if bitmap.width() == 0 || bitmap.height() == 0 {
        return Err(ProtocolError::invalid_parameter(
            "bitmap",
            format!("{}x{} bitmap has no pixels", bitmap.width(), bitmap.height()),
        ));
    }

    let far_corner = |origin: u16, extent: u16, axis: &str| {
        origin.checked_add(extent - 1).ok_or_else(|| {
            ProtocolError::invalid_parameter(
                "bitmap",
                format!("{} extent {}+{} overflows 16 bits", axis, origin, extent),
            )
        })
    };
    let x1 = far_corner(x0, bitmap.width(), "x")?;
    let y1 = far_corner(y0, bitmap.height(), "y")?;

    packed_size(usize::from(bitmap.width()), usize::from(bitmap.height()))?;
    raw_bitmap_payload(x0, y0, x1, y1, &bitmap.pack(), color)
}

fn raw_bitmap_payload(
    x0: u16,
    y0: u16,
    x1: u16,
    y1: u16,
    bits: &[u8],
    color: Rgb,
) -> Result<Vec<u8>> {
    let length = encode_length(BITMAP_FIXED_LEN + bits.len())?;

    let mut payload = Vec::with_capacity(1 + length.len() + BITMAP_FIXED_LEN + bits.len());
    payload.push(TLV_TAG);
    payload.extend_from_slice(&length);
    payload.push(SUBTYPE_RAW_BITMAP);
    payload.extend_from_slice(&color.to_bytes());
    push_coords(&mut payload, x0, y0, x1, y1);
    payload.extend_from_slice(bits);
    Ok(payload)
}

/// Packed byte count of a `width` x `height` bitmap, rejected when the TLV
/// length field cannot carry it.
fn packed_size(width: usize, height: usize) -> Result<usize> {
    let bits_len = width.div_ceil(8).saturating_mul(height);
    if BITMAP_FIXED_LEN.saturating_add(bits_len) > MAX_ENCODED_LENGTH {
        return Err(ProtocolError::invalid_parameter(
            "bitmap",
            format!(
                "{}x{} bitmap needs {} bytes, the length field carries at most {}",
                width,
                height,
                bits_len,
                MAX_ENCODED_LENGTH - BITMAP_FIXED_LEN
            ),
        ));
    }
    Ok(bits_len)
}

/// Packs straight from the point set; the bounding box may span all 65536
/// columns, which a [`BitMatrix`] cannot hold.
fn pixels_payload(points: &BTreeSet<(u16, u16)>, color: Rgb) -> Result<Vec<u8>> {
    let (x0, y0, x1, y1) = bounding_box(points).ok_or(ProtocolError::EmptyPointSet)?;

    let width = usize::from(x1 - x0) + 1;
    let height = usize::from(y1 - y0) + 1;
    let row_bytes = width.div_ceil(8);
    let mut bits = vec![0u8; packed_size(width, height)?];
    for &(x, y) in points {
        let (dx, dy) = (usize::from(x - x0), usize::from(y - y0));
        bits[dy * row_bytes + dx / 8] |= 0x80 >> (dx % 8);
    }
    raw_bitmap_payload(x0, y0, x1, y1, &bits, color)
}

/// Tight inclusive bounding box of a point set.
pub fn bounding_box(points: &BTreeSet<(u16, u16)>) -> Option<(u16, u16, u16, u16)> {
    points.iter().fold(None, |acc, &(x, y)| match acc {
        None => Some((x, y, x, y)),
        Some((x0, y0, x1, y1)) => Some((x0.min(x), y0.min(y), x1.max(x), y1.max(y))),
    })
}

fn push_coords(payload: &mut Vec<u8>, x0: u16, y0: u16, x1: u16, y1: u16) {
    for v in [x0, y0, x1, y1] {
        payload.extend_from_slice(&v.to_le_bytes());
    }
}

/// Variable-length length field: 7 data bits per byte, least significant
/// group first, high bit set on every byte but the last.
pub fn encode_length(length: usize) -> Result<Vec<u8>> {
    match length {
        0..0x80 => Ok(vec![length as u8]),
        0x80..0x4000 => Ok(vec![0x80 | (length & 0x7F) as u8, ((length >> 7) & 0x7F) as u8]),
        0x4000..=MAX_ENCODED_LENGTH => Ok(vec![
            0x80 | (length & 0x7F) as u8,
            0x80 | ((length >> 7) & 0x7F) as u8,
            ((length >> 14) & 0x7F) as u8,
        ]),
        _ => Err(ProtocolError::invalid_parameter(
            "payload length",
            format!("{} exceeds the {}-byte maximum", length, MAX_ENCODED_LENGTH),
        )),
    }
}

/// Wrap a payload in the real-time envelope.
///
/// Only the low byte of `payload + 6` is transmitted in the length field.
pub(crate) fn frame_realtime(command: u8, payload: &[u8], sequence: u16) -> Packet {
    let mut bytes = Vec::with_capacity(MAGIC_HEADER.len() + 6 + payload.len() + 2);
    bytes.extend_from_slice(&MAGIC_HEADER);
    bytes.push(((payload.len() + 6) & 0xFF) as u8);
    bytes.extend_from_slice(&sequence.to_le_bytes());
    bytes.push(0x00);
    bytes.push(COMMAND_FLAGS);
    bytes.push(command);
    bytes.extend_from_slice(payload);
    append_trailer(&mut bytes);
    Packet::new(bytes)
}
