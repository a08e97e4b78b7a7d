//! Core value types shared by the codecs, the transport and the session.
//!
//! - [`Packet`] is one immutable link-layer write
//! - [`Rgb`] is a color in device byte order
//! - [`DisplayGeometry`] bounds drawing coordinates to the panel

mod color;
mod geometry;
mod packet;

pub use color::Rgb;
pub use geometry::{DEFAULT_HEIGHT, DEFAULT_WIDTH, DisplayGeometry};
pub use packet::{MAGIC_HEADER, Packet, hex};
