//! In-memory element tree.
//!
//! Stands in for a rendered document: tests use it to observe exactly what
//! the engine did, and the CLI builds one per simulated page load from a
//! site fixture. Each element declares the selectors it answers to.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{ElementId, Emphasis, Page, Rect, Viewport};

/// What happens when an element's click behavior runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickEffect {
    /// Selectors of elements that become visible
    #[serde(default)]
    pub reveal: Vec<String>,
    /// Selectors of elements that become hidden
    #[serde(default)]
    pub hide: Vec<String>,
    /// Document to load (e.g. a form submit that redirects)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigate: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSpec {
    pub selectors: Vec<String>,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub checked: bool,
    /// Options offered when the element is a select
    #[serde(default)]
    pub options: usize,
    #[serde(default)]
    pub rect: Rect,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub on_click: ClickEffect,
}

impl ElementSpec {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selectors: vec![selector.into()],
            value: String::new(),
            checked: false,
            options: 0,
            rect: Rect::new(100.0, 100.0, 200.0, 40.0),
            hidden: false,
            on_click: ClickEffect::default(),
        }
    }

    pub fn also_matches(mut self, selector: impl Into<String>) -> Self {
        self.selectors.push(selector.into());
        self
    }

    pub fn at(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_options(mut self, options: usize) -> Self {
        self.options = options;
        self
    }

    pub fn checked(mut self) -> Self {
        self.checked = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn reveals(mut self, selector: impl Into<String>) -> Self {
        self.on_click.reveal.push(selector.into());
        self
    }

    pub fn navigates_to(mut self, destination: impl Into<String>) -> Self {
        self.on_click.navigate = Some(destination.into());
        self
    }
}

/// Serializable description of one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSpec {
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default)]
    pub elements: Vec<ElementSpec>,
}

#[derive(Debug, Clone)]
struct Element {
    spec: ElementSpec,
    value: String,
    checked: bool,
    hidden: bool,
}

impl Element {
    fn answers_to(&self, selector: &str) -> bool {
        self.spec.selectors.iter().any(|s| s == selector)
    }
}

#[derive(Debug, Clone)]
pub struct MemoryPage {
    location: String,
    viewport: Viewport,
    elements: Vec<Element>,
    input_log: Vec<ElementId>,
    clicks: Vec<ElementId>,
    emphasized: BTreeSet<ElementId>,
    scrolled: Vec<ElementId>,
    focused: Option<ElementId>,
    navigation: Option<String>,
}

impl MemoryPage {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            viewport: Viewport::default(),
            elements: Vec::new(),
            input_log: Vec::new(),
            clicks: Vec::new(),
            emphasized: BTreeSet::new(),
            scrolled: Vec::new(),
            focused: None,
            navigation: None,
        }
    }

    pub fn from_spec(location: impl Into<String>, spec: &PageSpec) -> Self {
        let mut page = Self::new(location).with_viewport(spec.viewport);
        for element in &spec.elements {
            page.add(element.clone());
        }
        page
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with(mut self, spec: ElementSpec) -> Self {
        self.add(spec);
        self
    }

    pub fn add(&mut self, spec: ElementSpec) -> ElementId {
        let id = ElementId(self.elements.len());
        self.elements.push(Element {
            value: spec.value.clone(),
            checked: spec.checked,
            hidden: spec.hidden,
            spec,
        });
        id
    }

    fn visible(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.hidden)
            .map(|(i, e)| (ElementId(i), e))
    }

    fn set_hidden(&mut self, selector: &str, hidden: bool) {
        for element in &mut self.elements {
            if element.answers_to(selector) {
                element.hidden = hidden;
            }
        }
    }

    /// Current value of the first visible element matching `selector`
    pub fn value_of(&self, selector: &str) -> Option<String> {
        self.query(selector).map(|id| self.value(id))
    }

    pub fn is_checked(&self, element: ElementId) -> bool {
        self.elements
            .get(element.0)
            .is_some_and(|e| e.checked)
    }

    /// Input notifications dispatched for `element`
    pub fn input_count(&self, element: ElementId) -> usize {
        self.input_log.iter().filter(|id| **id == element).count()
    }

    pub fn clicks(&self) -> &[ElementId] {
        &self.clicks
    }

    pub fn emphasized(&self) -> Vec<ElementId> {
        self.emphasized.iter().copied().collect()
    }

    pub fn scrolled(&self) -> &[ElementId] {
        &self.scrolled
    }

    pub fn focused(&self) -> Option<ElementId> {
        self.focused
    }
}

impl Page for MemoryPage {
    fn location(&self) -> &str {
        &self.location
    }

    fn query(&self, selector: &str) -> Option<ElementId> {
        self.visible()
            .find(|(_, e)| e.answers_to(selector))
            .map(|(id, _)| id)
    }

    fn count(&self, selector: &str) -> usize {
        self.visible().filter(|(_, e)| e.answers_to(selector)).count()
    }

    fn query_all(&self, selector: &str) -> Vec<ElementId> {
        self.visible()
            .filter(|(_, e)| e.answers_to(selector))
            .map(|(id, _)| id)
            .collect()
    }

    fn option_count(&self, element: ElementId) -> usize {
        self.elements.get(element.0).map_or(0, |e| e.spec.options)
    }

    fn value(&self, element: ElementId) -> String {
        self.elements
            .get(element.0)
            .map(|e| e.value.clone())
            .unwrap_or_default()
    }

    fn set_value(&mut self, element: ElementId, value: &str) {
        if let Some(e) = self.elements.get_mut(element.0) {
            e.value = value.to_string();
        }
    }

    fn dispatch_input(&mut self, element: ElementId) {
        self.input_log.push(element);
    }

    fn set_checked(&mut self, element: ElementId, checked: bool) {
        if let Some(e) = self.elements.get_mut(element.0) {
            e.checked = checked;
        }
    }

    fn focus(&mut self, element: ElementId) {
        self.focused = Some(element);
    }

    fn click(&mut self, element: ElementId) {
        self.clicks.push(element);
        let Some(effect) = self.elements.get(element.0).map(|e| e.spec.on_click.clone()) else {
            return;
        };
        for selector in &effect.reveal {
            self.set_hidden(selector, false);
        }
        for selector in &effect.hide {
            self.set_hidden(selector, true);
        }
        if let Some(destination) = effect.navigate {
            self.navigate(&destination);
        }
    }

    fn bounds(&self, element: ElementId) -> Rect {
        self.elements
            .get(element.0)
            .map(|e| e.spec.rect)
            .unwrap_or_default()
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn scroll_into_view(&mut self, element: ElementId) {
        self.scrolled.push(element);
    }

    fn apply_emphasis(&mut self, element: ElementId, _emphasis: &Emphasis) {
        self.emphasized.insert(element);
    }

    fn clear_emphasis(&mut self, element: ElementId) {
        self.emphasized.remove(&element);
    }

    fn navigate(&mut self, destination: &str) {
        self.navigation = Some(destination.to_string());
    }

    fn navigation_request(&self) -> Option<&str> {
        self.navigation.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rooms_page(rooms: usize) -> MemoryPage {
        let mut page = MemoryPage::new("editar-sala.html");
        for _ in 0..rooms {
            page.add(ElementSpec::new(".card-sala-editar").reveals("#formEditarSala"));
        }
        page.add(ElementSpec::new("#formEditarSala").hidden());
        page
    }

    #[test]
    fn test_count_tracks_matching_elements() {
        assert_eq!(rooms_page(0).count(".card-sala-editar"), 0);
        assert_eq!(rooms_page(3).count(".card-sala-editar"), 3);
    }

    #[test]
    fn test_hidden_elements_do_not_match() {
        let page = rooms_page(1);
        assert!(page.query("#formEditarSala").is_none());
    }

    #[test]
    fn test_click_reveals_elements() {
        let mut page = rooms_page(2);
        let card = page.query(".card-sala-editar").unwrap();
        page.click(card);
        assert!(page.query("#formEditarSala").is_some());
        assert_eq!(page.clicks(), &[card]);
    }

    #[test]
    fn test_click_can_request_navigation() {
        let mut page = MemoryPage::new("a.html")
            .with(ElementSpec::new("#go").navigates_to("b.html"));
        let go = page.query("#go").unwrap();
        page.click(go);
        assert_eq!(page.navigation_request(), Some("b.html"));
    }

    #[test]
    fn test_input_notifications_are_counted_per_element() {
        let mut page = MemoryPage::new("a.html")
            .with(ElementSpec::new("#nome"))
            .with(ElementSpec::new("#tipo"));
        let nome = page.query("#nome").unwrap();
        let tipo = page.query("#tipo").unwrap();
        page.dispatch_input(nome);
        page.dispatch_input(nome);
        page.dispatch_input(tipo);
        assert_eq!(page.input_count(nome), 2);
        assert_eq!(page.input_count(tipo), 1);
    }

    #[test]
    fn test_element_can_answer_to_several_selectors() {
        let page = MemoryPage::new("a.html")
            .with(ElementSpec::new("#submit").also_matches("button[type=\"submit\"]"));
        assert_eq!(page.query("#submit"), page.query("button[type=\"submit\"]"));
    }

    #[test]
    fn test_from_spec_yaml() {
        let yaml = r##"
viewport: { width: 1024, height: 768 }
elements:
  - selectors: ["#fotoExistente"]
    options: 3
"##;
        let spec: PageSpec = serde_yaml::from_str(yaml).unwrap();
        let page = MemoryPage::from_spec("adicionar-sala.html", &spec);
        let select = page.query("#fotoExistente").unwrap();
        assert_eq!(page.option_count(select), 3);
        assert_eq!(page.viewport().width, 1024.0);
    }
}
