use serde::{Serialize, Deserialize};
use std::fmt;

/// Spatial shape of one sample flowing between layers.
///
/// A sample row stores element (x, y, d) at column
/// `d * height * width + y * width + x`. Flat layers use (1, 1, units).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerShape {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
}

impl LayerShape {
    pub const fn new(width: usize, height: usize, depth: usize) -> Self {
        LayerShape { width, height, depth }
    }

    pub const fn flat(units: usize) -> Self {
        LayerShape { width: 1, height: 1, depth: units }
    }

    pub const fn units(&self) -> usize {
        self.width * self.height * self.depth
    }

    #[inline]
    pub const fn index(&self, x: usize, y: usize, d: usize) -> usize {
        (d * self.height + y) * self.width + x
    }
}

impl Default for LayerShape {
    fn default() -> Self {
        LayerShape::flat(0)
    }
}

impl fmt::Display for LayerShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.width, self.height, self.depth)
    }
}

/// Number of window positions along one axis:
/// `floor((input + 2 * padding - window) / stride) + 1`.
///
/// Returns `None` when the window does not fit the padded input or the
/// stride is zero.
pub fn filter_grid_length(input: usize, window: usize, stride: usize, padding: usize) -> Option<usize> {
    let padded = input + 2 * padding;
    if stride == 0 || window == 0 || window > padded {
        return None;
    }
    Some((padded - window) / stride + 1)
}
