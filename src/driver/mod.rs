pub mod webdriver;

#[cfg(test)]
pub mod fake;

use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

pub use webdriver::WebDriverSession;

const WAIT_POLL: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("webdriver transport: {0}")]
    Http(#[from] reqwest::Error),
    #[error("webdriver {error}: {message}")]
    Protocol { error: String, message: String },
    #[error("malformed webdriver response: {0}")]
    Malformed(String),
    #[error("no active browser session")]
    NoSession,
    #[error("timed out after {0:?} waiting for `{1}`")]
    Timeout(Duration, String),
}

pub type DriverResult<T> = Result<T, DriverError>;

/// Opaque handle to an element in the live page. Only meaningful to the driver
/// that produced it, and only until the page changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Element(pub String);

/// What the scraper needs from a browser session. One session is shared by every
/// seed in a batch, so all calls go through `&mut self`.
pub trait PageDriver {
    fn navigate(&mut self, url: &str) -> DriverResult<()>;
    fn current_url(&mut self) -> DriverResult<String>;
    fn page_source(&mut self) -> DriverResult<String>;
    fn find_elements(&mut self, css: &str) -> DriverResult<Vec<Element>>;
    fn find_child_elements(&mut self, parent: &Element, css: &str) -> DriverResult<Vec<Element>>;
    fn attribute(&mut self, element: &Element, name: &str) -> DriverResult<Option<String>>;
    fn text(&mut self, element: &Element) -> DriverResult<String>;
    fn is_displayed(&mut self, element: &Element) -> DriverResult<bool>;
    fn click(&mut self, element: &Element) -> DriverResult<()>;
    /// Run `script` with `args` bound to `arguments[..]`; returns the script's JSON result.
    fn execute_script(&mut self, script: &str, args: &[&Element]) -> DriverResult<serde_json::Value>;
    fn quit(&mut self) -> DriverResult<()>;

    /// Poll until at least one element matches or `timeout` passes.
    fn wait_for_elements(&mut self, css: &str, timeout: Duration) -> DriverResult<Vec<Element>> {
        let deadline = Instant::now() + timeout;
        loop {
            let found = self.find_elements(css)?;
            if !found.is_empty() {
                return Ok(found);
            }
            if Instant::now() >= deadline {
                return Err(DriverError::Timeout(timeout, css.to_string()));
            }
            thread::sleep(WAIT_POLL.min(timeout));
        }
    }
}
