//! Checksums shared by every YS-protocol packet kind.
//!
//! Packets end in a two-byte trailer: the low byte of the byte sum, then the
//! next byte of that same sum. Both are taken over every byte that precedes
//! the trailer.

/// Sum of all bytes, modulo 256.
pub fn sum_mod256(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Second byte of the full byte sum: `(sum / 256) % 256`.
pub fn high_byte_of_sum(bytes: &[u8]) -> u8 {
    // Bits above 15 never reach the result, so the sum may wrap.
    let sum = bytes.iter().fold(0u16, |acc, &b| acc.wrapping_add(u16::from(b)));
    (sum >> 8) as u8
}

/// Append the two-byte trailer computed over everything already in `packet`.
pub fn append_trailer(packet: &mut Vec<u8>) {
    let low = sum_mod256(packet);
    let high = high_byte_of_sum(packet);
    packet.push(low);
    packet.push(high);
}

/// Check that the last two bytes of `packet` are the trailer of the bytes before them.
pub fn verify_trailer(packet: &[u8]) -> bool {
    if packet.len() < 3 {
        return false;
    }
    let (body, trailer) = packet.split_at(packet.len() - 2);
    trailer == [sum_mod256(body), high_byte_of_sum(body)]
}
