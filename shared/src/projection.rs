use std::fmt;

use crate::county::Coordinate;

/// Fraction of the data extent added on each side of the fitted box.
pub const PADDING_RATIO: f64 = 0.1;

/// Planar viewport in source coordinates (degrees used directly as x/y).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

/// Rough extent of Kenya, used whenever the loaded boundaries give no usable bounds.
pub const DEFAULT_VIEW_BOX: ViewBox = ViewBox {
    min_x: 33.5,
    min_y: -5.0,
    width: 8.5,
    height: 10.0,
};

impl Default for ViewBox {
    fn default() -> Self {
        DEFAULT_VIEW_BOX
    }
}

impl ViewBox {
    /// Fit a padded box around every finite coordinate.
    ///
    /// Falls back to [`DEFAULT_VIEW_BOX`] when there are no finite points or
    /// the extent is degenerate on either axis.
    pub fn fit<'a>(coordinates: impl IntoIterator<Item = &'a Coordinate>) -> Self {
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (
            f64::INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
        );
        for c in coordinates.into_iter().filter(|c| c.is_valid()) {
            min_x = min_x.min(c.x);
            min_y = min_y.min(c.y);
            max_x = max_x.max(c.x);
            max_y = max_y.max(c.y);
        }

        let width = max_x - min_x;
        let height = max_y - min_y;
        if !width.is_finite() || !height.is_finite() || width <= 0.0 || height <= 0.0 {
            return DEFAULT_VIEW_BOX;
        }

        Self {
            min_x: min_x - width * PADDING_RATIO,
            min_y: min_y - height * PADDING_RATIO,
            width: width * (1.0 + 2.0 * PADDING_RATIO),
            height: height * (1.0 + 2.0 * PADDING_RATIO),
        }
    }

    pub fn max_x(&self) -> f64 {
        self.min_x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.min_y + self.height
    }

    /// Offset for a `scale(1,-1)` flip that keeps the box mapped onto itself,
    /// so north ends up at the top of the rendered map.
    pub fn mirror_offset(&self) -> f64 {
        2.0 * self.min_y + self.height
    }

    /// Display position of a source coordinate after the vertical flip.
    pub fn project(&self, c: &Coordinate) -> (f64, f64) {
        (c.x, self.mirror_offset() - c.y)
    }
}

impl fmt::Display for ViewBox {
    /// SVG `viewBox` attribute form: `min-x min-y width height`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.min_x, self.min_y, self.width, self.height
        )
    }
}
