//! Page abstraction consumed by the tour engine.
//!
//! The engine never sees markup. It asks the page for elements by selector,
//! reads their geometry, and drives a small set of mutation primitives.
//! Selectors are opaque strings interpreted by the implementation.

pub mod memory;
pub mod site;

pub use memory::{ElementSpec, MemoryPage, PageSpec};
pub use site::SiteFixture;

use serde::{Deserialize, Serialize};

/// Handle to an element within one loaded document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub usize);

/// Element bounds in viewport coordinates (CSS pixels)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Entirely inside a viewport of the given size
    pub fn fits_within(&self, viewport: Viewport) -> bool {
        self.top() >= 0.0
            && self.left() >= 0.0
            && self.bottom() <= viewport.height
            && self.right() <= viewport.width
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
        }
    }
}

/// Visual treatment applied to the highlighted element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emphasis {
    pub outline_color: String,
    pub outline_px: u32,
    pub offset_px: u32,
    pub scale: f64,
    pub z_index: i32,
}

/// Everything the engine needs from the hosting document
pub trait Page {
    /// Identifier of the loaded document (e.g. `adicionar-sala.html`)
    fn location(&self) -> &str;

    /// First element matching `selector`
    fn query(&self, selector: &str) -> Option<ElementId>;

    /// Live count of elements matching `selector`
    fn count(&self, selector: &str) -> usize;

    /// All elements matching `selector`, in document order
    fn query_all(&self, selector: &str) -> Vec<ElementId>;

    /// Number of options in a select element (0 for anything else)
    fn option_count(&self, element: ElementId) -> usize;

    fn value(&self, element: ElementId) -> String;

    fn set_value(&mut self, element: ElementId, value: &str);

    /// Notify listeners that the element's value changed
    fn dispatch_input(&mut self, element: ElementId);

    fn set_checked(&mut self, element: ElementId, checked: bool);

    fn focus(&mut self, element: ElementId);

    /// Invoke the element's click behavior
    fn click(&mut self, element: ElementId);

    fn bounds(&self, element: ElementId) -> Rect;

    fn viewport(&self) -> Viewport;

    fn scroll_into_view(&mut self, element: ElementId);

    fn apply_emphasis(&mut self, element: ElementId, emphasis: &Emphasis);

    fn clear_emphasis(&mut self, element: ElementId);

    /// Replace the loaded document. Everything built on this page load is
    /// discarded afterwards.
    fn navigate(&mut self, destination: &str);

    /// Destination of a navigation that has begun, by the engine or by an
    /// element's click behavior
    fn navigation_request(&self) -> Option<&str>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges() {
        let rect = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(rect.right(), 110.0);
        assert_eq!(rect.bottom(), 70.0);
    }

    #[test]
    fn test_rect_fits_within_viewport() {
        let viewport = Viewport {
            width: 800.0,
            height: 600.0,
        };
        assert!(Rect::new(0.0, 0.0, 800.0, 600.0).fits_within(viewport));
        assert!(!Rect::new(-1.0, 0.0, 10.0, 10.0).fits_within(viewport));
        assert!(!Rect::new(0.0, 590.0, 10.0, 20.0).fits_within(viewport));
    }
}
