use crate::page::{ElementId, Emphasis, Page};

/// Emphasizes at most one element at a time.
///
/// The current element lives in a single slot: highlighting a new element
/// always clears the previous one's treatment first, so an outline can
/// never be left behind.
#[derive(Debug, Clone)]
pub struct Highlighter {
    emphasis: Emphasis,
    current: Option<ElementId>,
}

impl Highlighter {
    pub fn new(emphasis: Emphasis) -> Self {
        Self {
            emphasis,
            current: None,
        }
    }

    pub fn current(&self) -> Option<ElementId> {
        self.current
    }

    pub fn highlight<P: Page + ?Sized>(&mut self, page: &mut P, element: ElementId) {
        self.clear(page);
        page.apply_emphasis(element, &self.emphasis);
        page.scroll_into_view(element);
        self.current = Some(element);
    }

    pub fn clear<P: Page + ?Sized>(&mut self, page: &mut P) {
        if let Some(previous) = self.current.take() {
            page.clear_emphasis(previous);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HighlightConfig;
    use crate::page::{ElementSpec, MemoryPage};

    fn setup() -> (MemoryPage, ElementId, ElementId, Highlighter) {
        let mut page = MemoryPage::new("a.html");
        let first = page.add(ElementSpec::new("#first"));
        let second = page.add(ElementSpec::new("#second"));
        let highlighter = Highlighter::new(HighlightConfig::default().emphasis());
        (page, first, second, highlighter)
    }

    #[test]
    fn test_new_highlight_clears_previous() {
        let (mut page, first, second, mut highlighter) = setup();
        highlighter.highlight(&mut page, first);
        highlighter.highlight(&mut page, second);
        assert_eq!(page.emphasized(), vec![second]);
        assert_eq!(highlighter.current(), Some(second));
    }

    #[test]
    fn test_highlight_scrolls_into_view() {
        let (mut page, first, _, mut highlighter) = setup();
        highlighter.highlight(&mut page, first);
        assert_eq!(page.scrolled(), &[first]);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (mut page, first, _, mut highlighter) = setup();
        highlighter.highlight(&mut page, first);
        highlighter.clear(&mut page);
        highlighter.clear(&mut page);
        assert!(page.emphasized().is_empty());
        assert_eq!(highlighter.current(), None);
    }
}
