use scraper::{ElementRef, Html, Selector};

use crate::driver::{DriverResult, PageDriver};

/// Markup captured from the live page at one instant. Parse-phase code only ever
/// sees this, never the driver, so it can be tested against saved pages.
pub struct Snapshot {
    html: Html,
}

impl Snapshot {
    pub fn parse(source: &str) -> Self {
        Snapshot {
            html: Html::parse_document(source),
        }
    }

    pub fn capture(driver: &mut dyn PageDriver) -> DriverResult<Self> {
        Ok(Snapshot::parse(&driver.page_source()?))
    }

    pub fn select<'a>(&'a self, selector: &'a Selector) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        self.html.select(selector)
    }
}

pub fn attr<'a>(element: &ElementRef<'a>, name: &str) -> Option<&'a str> {
    element.value().attr(name)
}

/// Visible-ish text: text nodes trimmed and joined by single spaces.
pub fn text_of(element: &ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// First descendant of `element` matching `selector`.
pub fn find_in<'a>(element: &ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    element.select(selector).next()
}
