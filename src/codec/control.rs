//! Mode-control packets needed before real-time drawing.
//!
//! Stored media keeps playing on the panel until the device is switched
//! into its drawing ("graffiti") game mode; draw packets are only visible
//! after that. Playback can also be stopped outright.

use crate::codec::draw::{COMMAND_FLAGS, frame_realtime};
use crate::types::{MAGIC_HEADER, Packet};

/// Command byte of the game command.
const GAME_COMMAND: u8 = 0x02;

/// Game id of the drawing mode.
pub const DRAWING_GAME_ID: u8 = 16;

/// Index of the program-playback command.
pub const PLAYBACK_COMMAND_INDEX: u8 = 12;

const PLAYBACK_STOP_PAYLOAD: [u8; 4] = [0x36, 0x02, 0x00, 0xFF];

/// Enter a game mode; use [`DRAWING_GAME_ID`] for drawing.
pub fn build_game_mode(game_id: u8) -> Packet {
    frame_realtime(GAME_COMMAND, &[0x30, 0x01, game_id.wrapping_add(0x80)], 0)
}

/// Stop playback of stored programs.
///
/// Uses the generic command envelope: a two-byte little-endian length
/// prefix, then the magic header, inner length, sequence number, flags and
/// command index, closed by a 16-bit little-endian sum of everything after
/// the prefix.
pub fn build_playback_stop(sequence: u16) -> Packet {
    build_generic_command(PLAYBACK_COMMAND_INDEX, &PLAYBACK_STOP_PAYLOAD, sequence)
}

fn build_generic_command(command_index: u8, payload: &[u8], sequence: u16) -> Packet {
    let inner_len = (payload.len() + 4) as u16;
    let total_len = (10 + payload.len() + 2) as u16;

    let mut bytes = Vec::with_capacity(usize::from(total_len) + 2);
    bytes.extend_from_slice(&total_len.to_le_bytes());
    bytes.extend_from_slice(&MAGIC_HEADER);
    bytes.extend_from_slice(&inner_len.to_le_bytes());
    bytes.extend_from_slice(&sequence.to_le_bytes());
    bytes.push(COMMAND_FLAGS);
    bytes.push(command_index);
    bytes.extend_from_slice(payload);

    let sum = bytes[2..].iter().fold(0u16, |acc, &b| acc.wrapping_add(u16::from(b)));
    bytes.extend_from_slice(&sum.to_le_bytes());
    Packet::new(bytes)
}
