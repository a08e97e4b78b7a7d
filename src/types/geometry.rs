//! Addressable area of the LED matrix

use serde::{Deserialize, Serialize};

use crate::{ProtocolError, Result};

/// Width of the reference 96x128 backpack.
pub const DEFAULT_WIDTH: u16 = 96;

/// Height of the reference 96x128 backpack.
pub const DEFAULT_HEIGHT: u16 = 128;

/// Pixel dimensions of a matrix.
///
/// The draw codec encodes coordinates verbatim; callers clamp through this
/// type first so nothing outside the panel reaches the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayGeometry {
    pub width: u16,
    pub height: u16,
}

impl Default for DisplayGeometry {
    fn default() -> Self {
        Self { width: DEFAULT_WIDTH, height: DEFAULT_HEIGHT }
    }
}

impl DisplayGeometry {
    pub fn new(width: u16, height: u16) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ProtocolError::invalid_parameter(
                "geometry",
                format!("{}x{} has no addressable pixels", width, height),
            ));
        }
        Ok(Self { width, height })
    }

    /// Largest valid x coordinate.
    pub fn max_x(&self) -> u16 {
        self.width.saturating_sub(1)
    }

    /// Largest valid y coordinate.
    pub fn max_y(&self) -> u16 {
        self.height.saturating_sub(1)
    }

    pub fn contains(&self, x: u16, y: u16) -> bool {
        x < self.width && y < self.height
    }

    pub fn clamp_point(&self, x: u16, y: u16) -> (u16, u16) {
        (x.min(self.max_x()), y.min(self.max_y()))
    }

    /// Clamp both corners of an inclusive rectangle onto the panel.
    pub fn clamp_rect(&self, x0: u16, y0: u16, x1: u16, y1: u16) -> (u16, u16, u16, u16) {
        let (x0, y0) = self.clamp_point(x0, y0);
        let (x1, y1) = self.clamp_point(x1, y1);
        (x0, y0, x1, y1)
    }
}
