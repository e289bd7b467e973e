//! Tooltip positioning.
//!
//! Sides are tried right, left, above, below; the first with room wins.
//! The result is then clamped into the viewport. Without an anchor, or when
//! the anchor is not fully on screen, the tooltip is centered.

use serde::{Deserialize, Serialize};

use crate::config::TooltipConfig;
use crate::page::{Rect, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Right,
    Left,
    Above,
    Below,
    Center,
}

/// Tooltip size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TooltipSize {
    pub width: f64,
    pub height: f64,
}

impl From<&TooltipConfig> for TooltipSize {
    fn from(config: &TooltipConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
        }
    }
}

/// Top-left corner of the tooltip and the side it sits on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub side: Side,
    pub x: f64,
    pub y: f64,
}

pub fn centered(viewport: Viewport, size: TooltipSize) -> Placement {
    Placement {
        side: Side::Center,
        x: (viewport.width - size.width) / 2.0,
        y: (viewport.height - size.height) / 2.0,
    }
}

pub fn place(
    anchor: Option<Rect>,
    viewport: Viewport,
    size: TooltipSize,
    config: &TooltipConfig,
) -> Placement {
    let Some(rect) = anchor else {
        return centered(viewport, size);
    };
    if !rect.fits_within(viewport) {
        return centered(viewport, size);
    }

    let beside_y = rect.top() + rect.height / 2.0 - size.height / 2.0;
    let (side, x, y) = if rect.right() + size.width + config.margin < viewport.width {
        (Side::Right, rect.right() + config.gap, beside_y)
    } else if rect.left() - size.width - config.margin > 0.0 {
        (Side::Left, rect.left() - size.width - config.gap, beside_y)
    } else if rect.top() > size.height + config.margin {
        (Side::Above, rect.left(), rect.top() - config.gap - size.height)
    } else {
        (Side::Below, rect.left(), rect.bottom() + config.gap)
    };

    Placement {
        side,
        x: clamp_axis(x, size.width, viewport.width, config.edge_padding),
        y: clamp_axis(y, size.height, viewport.height, config.edge_padding),
    }
}

/// Pull a span back inside `0..limit`, leaving `padding` at the edge it
/// overflowed. The leading edge wins when both overflow.
fn clamp_axis(start: f64, length: f64, limit: f64, padding: f64) -> f64 {
    let mut clamped = start;
    if start + length > limit {
        clamped = limit - length - padding;
    }
    if start < 0.0 {
        clamped = padding;
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        width: 1280.0,
        height: 800.0,
    };

    fn size() -> TooltipSize {
        TooltipSize {
            width: 320.0,
            height: 160.0,
        }
    }

    fn config() -> TooltipConfig {
        TooltipConfig::default()
    }

    #[test]
    fn test_no_anchor_centers() {
        let placement = place(None, VIEWPORT, size(), &config());
        assert_eq!(placement.side, Side::Center);
        assert_eq!(placement.x, 480.0);
        assert_eq!(placement.y, 320.0);
    }

    #[test]
    fn test_offscreen_anchor_centers() {
        let rect = Rect::new(100.0, 900.0, 200.0, 40.0);
        assert_eq!(place(Some(rect), VIEWPORT, size(), &config()).side, Side::Center);
    }

    #[test]
    fn test_prefers_right() {
        let rect = Rect::new(100.0, 300.0, 200.0, 40.0);
        let placement = place(Some(rect), VIEWPORT, size(), &config());
        assert_eq!(placement.side, Side::Right);
        assert_eq!(placement.x, 315.0);
        assert_eq!(placement.y, 300.0 + 20.0 - 80.0);
    }

    #[test]
    fn test_falls_back_to_left() {
        let rect = Rect::new(900.0, 300.0, 300.0, 40.0);
        let placement = place(Some(rect), VIEWPORT, size(), &config());
        assert_eq!(placement.side, Side::Left);
        assert_eq!(placement.x, 900.0 - 320.0 - 15.0);
    }

    #[test]
    fn test_falls_back_to_above() {
        let rect = Rect::new(100.0, 400.0, 1100.0, 40.0);
        let placement = place(Some(rect), VIEWPORT, size(), &config());
        assert_eq!(placement.side, Side::Above);
        assert_eq!(placement.y, 400.0 - 15.0 - 160.0);
        assert_eq!(placement.x, 100.0);
    }

    #[test]
    fn test_falls_back_to_below() {
        let rect = Rect::new(40.0, 100.0, 1200.0, 56.0);
        let placement = place(Some(rect), VIEWPORT, size(), &config());
        assert_eq!(placement.side, Side::Below);
        assert_eq!(placement.y, 171.0);
    }

    #[test]
    fn test_below_is_clamped_horizontally() {
        // Wide element near the top: tooltip goes below and would overflow
        // the right edge starting from the element's left
        let rect = Rect::new(1000.0, 20.0, 270.0, 40.0);
        let wide = TooltipSize {
            width: 1000.0,
            height: 160.0,
        };
        let placement = place(Some(rect), VIEWPORT, wide, &config());
        assert_eq!(placement.side, Side::Below);
        assert_eq!(placement.x, 1280.0 - 1000.0 - 10.0);
    }

    #[test]
    fn test_beside_is_clamped_to_top() {
        let rect = Rect::new(100.0, 0.0, 200.0, 20.0);
        let placement = place(Some(rect), VIEWPORT, size(), &config());
        assert_eq!(placement.side, Side::Right);
        assert_eq!(placement.y, 10.0);
    }

    #[test]
    fn test_clamp_axis() {
        assert_eq!(clamp_axis(-5.0, 100.0, 800.0, 10.0), 10.0);
        assert_eq!(clamp_axis(750.0, 100.0, 800.0, 10.0), 690.0);
        assert_eq!(clamp_axis(50.0, 100.0, 800.0, 10.0), 50.0);
    }
}
