//! RGB colors as the device expects them

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ProtocolError, Result};

/// 24-bit color, emitted on the wire as `R, G, B`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);
    pub const BLUE: Rgb = Rgb::new(0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Packed form `R + G * 256 + B * 65536`, as the companion app computes it.
    pub fn to_color_int(self) -> u32 {
        u32::from(self.r) | (u32::from(self.g) << 8) | (u32::from(self.b) << 16)
    }

    /// Inverse of [`Rgb::to_color_int`]; bits above 24 are ignored.
    pub fn from_color_int(color: u32) -> Self {
        Self::new((color & 0xFF) as u8, ((color >> 8) & 0xFF) as u8, ((color >> 16) & 0xFF) as u8)
    }

    /// Wire bytes in transmission order.
    pub fn to_bytes(self) -> [u8; 3] {
        let c = self.to_color_int();
        [(c & 0xFF) as u8, ((c >> 8) & 0xFF) as u8, ((c >> 16) & 0xFF) as u8]
    }
}

impl FromStr for Rgb {
    type Err = ProtocolError;

    /// Accepts `#rrggbb`, `rrggbb`, `0xrrggbb` and the short `#rgb` form.
    fn from_str(s: &str) -> Result<Self> {
        let raw = s.trim().to_ascii_lowercase();
        let raw = raw.strip_prefix('#').unwrap_or(&raw);
        let raw = raw.strip_prefix("0x").unwrap_or(raw);

        let expanded: String = if raw.len() == 3 {
            raw.chars().flat_map(|c| [c, c]).collect()
        } else {
            raw.to_string()
        };

        if expanded.len() != 6 || !expanded.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ProtocolError::invalid_parameter(
                "color",
                format!("'{}' is not a hex color like #ff0000", s),
            ));
        }

        let channel = |i: usize| {
            u8::from_str_radix(&expanded[i..i + 2], 16)
                .map_err(|e| ProtocolError::invalid_parameter("color", e.to_string()))
        };
        Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_all_accepted_forms() {
        assert_eq!("#ff0000".parse::<Rgb>().unwrap(), Rgb::RED);
        assert_eq!("00FF00".parse::<Rgb>().unwrap(), Rgb::GREEN);
        assert_eq!("0x0000ff".parse::<Rgb>().unwrap(), Rgb::BLUE);
        assert_eq!("#fff".parse::<Rgb>().unwrap(), Rgb::WHITE);
        assert_eq!("  #123456 ".parse::<Rgb>().unwrap(), Rgb::new(0x12, 0x34, 0x56));
    }

    #[test]
    fn rejects_malformed_colors() {
        for bad in ["", "#", "#ff00", "#gg0000", "red", "#ff00000", "0x12345"] {
            let err = bad.parse::<Rgb>().unwrap_err();
            assert!(
                matches!(err, ProtocolError::InvalidParameter { .. }),
                "{bad:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn wire_order_is_red_green_blue() {
        assert_eq!(Rgb::new(0x11, 0x22, 0x33).to_bytes(), [0x11, 0x22, 0x33]);
        assert_eq!(Rgb::new(0x11, 0x22, 0x33).to_color_int(), 0x332211);
    }

    proptest! {
        #[test]
        fn display_parses_back(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
            let color = Rgb::new(r, g, b);
            prop_assert_eq!(color.to_string().parse::<Rgb>().unwrap(), color);
            prop_assert_eq!(Rgb::from_color_int(color.to_color_int()), color);
        }
    }
}
