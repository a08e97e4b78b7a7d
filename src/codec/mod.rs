//! YS-protocol packet codecs.
//!
//! All encoders are pure: they validate their input first and either return
//! a finished [`Packet`](crate::types::Packet) or an error, never a partial
//! packet.
//!
//! - [`command`]: fixed reset / ready / upload-complete / brightness packets
//! - [`chunk`]: splitting an image container into checksummed chunks
//! - [`draw`]: immediate drawing primitives
//! - [`control`]: drawing-mode and playback control

pub mod chunk;
pub mod command;
pub mod control;
pub mod draw;

pub use chunk::{
    CHUNK_PACKET_SIZE, CHUNK_PAYLOAD_SIZE, Chunk, ChunkHeader, MAX_CHUNKS, build_upload_packets,
    split,
};
pub use command::{
    BRIGHTNESS_LEVELS, Command, build_brightness, build_ready, build_reset, build_upload_complete,
};
pub use control::{DRAWING_GAME_ID, build_game_mode, build_playback_stop};
pub use draw::{BitMatrix, DrawCommand};
