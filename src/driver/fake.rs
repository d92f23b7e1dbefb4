use std::collections::HashMap;

use serde_json::Value;

use super::{DriverError, DriverResult, Element, PageDriver};

/// Scripted in-memory page used by tests.
#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    pub text: String,
    pub attrs: HashMap<String, String>,
    pub displayed: bool,
    /// Page state installed when this element is clicked: (url, source).
    pub on_click: Option<(String, String)>,
}

impl FakeElement {
    pub fn new(text: &str) -> Self {
        FakeElement {
            text: text.to_string(),
            displayed: true,
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    pub fn navigates_to(mut self, url: &str, source: &str) -> Self {
        self.on_click = Some((url.to_string(), source.to_string()));
        self
    }
}

#[derive(Debug, Default)]
pub struct FakeDriver {
    pub url: String,
    pub source: String,
    /// Page state installed by `navigate`: (url, source).
    pub after_navigate: Option<(String, String)>,
    pub fail_navigation: bool,
    elements: HashMap<String, FakeElement>,
    by_css: HashMap<String, Vec<String>>,
    children: HashMap<(String, String), Vec<String>>,
    next_id: usize,
    pub navigations: Vec<String>,
    pub clicks: Vec<String>,
    pub scripts: Vec<String>,
    /// Returned from every `execute_script` call.
    pub script_result: Value,
}

impl FakeDriver {
    pub fn with_page(url: &str, source: &str) -> Self {
        FakeDriver {
            url: url.to_string(),
            source: source.to_string(),
            ..Default::default()
        }
    }

    /// Register `element` as a match for `css`; returns its handle.
    pub fn add(&mut self, css: &str, element: FakeElement) -> Element {
        let id = self.alloc(element);
        self.by_css.entry(css.to_string()).or_default().push(id.clone());
        Element(id)
    }

    pub fn add_child(&mut self, parent: &Element, css: &str, element: FakeElement) -> Element {
        let id = self.alloc(element);
        self.children
            .entry((parent.0.clone(), css.to_string()))
            .or_default()
            .push(id.clone());
        Element(id)
    }

    /// Drop `element` from the page; later reads of it fail as a stale reference.
    pub fn detach(&mut self, element: &Element) {
        self.elements.remove(&element.0);
    }

    /// Texts of clicked elements, in click order.
    pub fn clicked_texts(&self) -> Vec<String> {
        self.clicks
            .iter()
            .filter_map(|id| self.elements.get(id))
            .map(|e| e.text.clone())
            .collect()
    }

    fn alloc(&mut self, element: FakeElement) -> String {
        self.next_id += 1;
        let id = format!("el-{}", self.next_id);
        self.elements.insert(id.clone(), element);
        id
    }

    fn get(&self, element: &Element) -> DriverResult<&FakeElement> {
        self.elements.get(&element.0).ok_or_else(|| DriverError::Protocol {
            error: "stale element reference".into(),
            message: element.0.clone(),
        })
    }
}

impl PageDriver for FakeDriver {
    fn navigate(&mut self, url: &str) -> DriverResult<()> {
        self.navigations.push(url.to_string());
        if self.fail_navigation {
            return Err(DriverError::Protocol {
                error: "timeout".into(),
                message: "page load".into(),
            });
        }
        match self.after_navigate.clone() {
            Some((u, s)) => {
                self.url = u;
                self.source = s;
            }
            None => self.url = url.to_string(),
        }
        Ok(())
    }

    fn current_url(&mut self) -> DriverResult<String> {
        Ok(self.url.clone())
    }

    fn page_source(&mut self) -> DriverResult<String> {
        Ok(self.source.clone())
    }

    fn find_elements(&mut self, css: &str) -> DriverResult<Vec<Element>> {
        Ok(self
            .by_css
            .get(css)
            .map(|ids| ids.iter().cloned().map(Element).collect())
            .unwrap_or_default())
    }

    fn find_child_elements(&mut self, parent: &Element, css: &str) -> DriverResult<Vec<Element>> {
        Ok(self
            .children
            .get(&(parent.0.clone(), css.to_string()))
            .map(|ids| ids.iter().cloned().map(Element).collect())
            .unwrap_or_default())
    }

    fn attribute(&mut self, element: &Element, name: &str) -> DriverResult<Option<String>> {
        Ok(self.get(element)?.attrs.get(name).cloned())
    }

    fn text(&mut self, element: &Element) -> DriverResult<String> {
        Ok(self.get(element)?.text.clone())
    }

    fn is_displayed(&mut self, element: &Element) -> DriverResult<bool> {
        Ok(self.get(element)?.displayed)
    }

    fn click(&mut self, element: &Element) -> DriverResult<()> {
        let target = self.get(element)?.on_click.clone();
        self.clicks.push(element.0.clone());
        if let Some((url, source)) = target {
            self.url = url;
            self.source = source;
        }
        Ok(())
    }

    fn execute_script(&mut self, script: &str, _args: &[&Element]) -> DriverResult<Value> {
        self.scripts.push(script.to_string());
        Ok(self.script_result.clone())
    }

    fn quit(&mut self) -> DriverResult<()> {
        Ok(())
    }
}
