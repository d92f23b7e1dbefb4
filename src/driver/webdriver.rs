use std::time::Duration;

use rand::seq::SliceRandom;
use reqwest::blocking::Client;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::{DriverError, DriverResult, Element, PageDriver};
use crate::config::Settings;

/// W3C key under which element references travel on the wire.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// Blocking W3C WebDriver client bound to one browser session.
pub struct WebDriverSession {
    client: Client,
    base: String,
    session_id: Option<String>,
}

impl WebDriverSession {
    /// Open a browser session. Failure here is fatal for a batch run.
    pub fn start(settings: &Settings) -> DriverResult<Self> {
        let page_load = Duration::from_secs(settings.page_load_timeout_secs);
        let client = Client::builder()
            .timeout(page_load + Duration::from_secs(30))
            .build()?;

        let mut session = WebDriverSession {
            client,
            base: settings.webdriver_url.trim_end_matches('/').to_string(),
            session_id: None,
        };

        let created = session.send(Method::POST, "/session", Some(capabilities(settings.headless)))?;
        let id = created
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| DriverError::Malformed(format!("new session without id: {created}")))?;
        session.session_id = Some(id.to_string());

        session.command(
            Method::POST,
            "timeouts",
            Some(json!({ "pageLoad": page_load.as_millis() as u64 })),
        )?;

        info!(session = id, endpoint = %session.base, "WebDriver session ready");
        Ok(session)
    }

    fn send(&self, method: Method, path: &str, body: Option<Value>) -> DriverResult<Value> {
        let url = format!("{}{}", self.base, path);
        debug!(%method, %url, "webdriver request");
        let request = self.client.request(method, url);
        let request = match body {
            Some(b) => request.json(&b),
            None => request,
        };

        let response = request.send()?;
        let status = response.status();
        let payload: Value = response.json()?;
        let value = payload.get("value").cloned().unwrap_or(Value::Null);

        if !status.is_success() {
            let field = |key: &str| {
                value
                    .get(key)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            return Err(DriverError::Protocol {
                error: field("error"),
                message: field("message"),
            });
        }
        Ok(value)
    }

    fn command(&self, method: Method, suffix: &str, body: Option<Value>) -> DriverResult<Value> {
        let id = self.session_id.as_deref().ok_or(DriverError::NoSession)?;
        self.send(method, &format!("/session/{id}/{suffix}"), body)
    }

    fn element_command(
        &self,
        method: Method,
        element: &Element,
        suffix: &str,
        body: Option<Value>,
    ) -> DriverResult<Value> {
        self.command(method, &format!("element/{}/{}", element.0, suffix), body)
    }
}

impl PageDriver for WebDriverSession {
    fn navigate(&mut self, url: &str) -> DriverResult<()> {
        self.command(Method::POST, "url", Some(json!({ "url": url })))?;
        Ok(())
    }

    fn current_url(&mut self) -> DriverResult<String> {
        as_string(self.command(Method::GET, "url", None)?)
    }

    fn page_source(&mut self) -> DriverResult<String> {
        as_string(self.command(Method::GET, "source", None)?)
    }

    fn find_elements(&mut self, css: &str) -> DriverResult<Vec<Element>> {
        let found = self.command(Method::POST, "elements", Some(css_locator(css)))?;
        element_list(found)
    }

    fn find_child_elements(&mut self, parent: &Element, css: &str) -> DriverResult<Vec<Element>> {
        let found = self.element_command(Method::POST, parent, "elements", Some(css_locator(css)))?;
        element_list(found)
    }

    fn attribute(&mut self, element: &Element, name: &str) -> DriverResult<Option<String>> {
        let value = self.element_command(Method::GET, element, &format!("attribute/{name}"), None)?;
        Ok(value.as_str().map(str::to_string))
    }

    fn text(&mut self, element: &Element) -> DriverResult<String> {
        as_string(self.element_command(Method::GET, element, "text", None)?)
    }

    fn is_displayed(&mut self, element: &Element) -> DriverResult<bool> {
        let value = self.element_command(Method::GET, element, "displayed", None)?;
        value
            .as_bool()
            .ok_or_else(|| DriverError::Malformed(format!("displayed: {value}")))
    }

    fn click(&mut self, element: &Element) -> DriverResult<()> {
        self.element_command(Method::POST, element, "click", Some(json!({})))?;
        Ok(())
    }

    fn execute_script(&mut self, script: &str, args: &[&Element]) -> DriverResult<Value> {
        let args: Vec<Value> = args.iter().map(|e| json!({ ELEMENT_KEY: e.0 })).collect();
        self.command(
            Method::POST,
            "execute/sync",
            Some(json!({ "script": script, "args": args })),
        )
    }

    fn quit(&mut self) -> DriverResult<()> {
        let Some(id) = self.session_id.take() else {
            return Ok(());
        };
        self.send(Method::DELETE, &format!("/session/{id}"), None)?;
        info!(session = %id, "WebDriver session closed");
        Ok(())
    }
}

impl Drop for WebDriverSession {
    fn drop(&mut self) {
        if let Err(e) = self.quit() {
            warn!(error = %e, "failed to close WebDriver session");
        }
    }
}

fn capabilities(headless: bool) -> Value {
    let user_agent = USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0]);

    let mut args = vec![
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
        "--window-size=1920,1080".to_string(),
        "--lang=vi".to_string(),
        format!("--user-agent={user_agent}"),
    ];
    if headless {
        args.insert(0, "--headless=new".to_string());
    }

    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "goog:chromeOptions": {
                    "args": args,
                    "prefs": { "intl.accept_languages": "vi,en" }
                }
            }
        }
    })
}

fn css_locator(css: &str) -> Value {
    json!({ "using": "css selector", "value": css })
}

fn as_string(value: Value) -> DriverResult<String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(DriverError::Malformed(format!("expected string, got {other}"))),
    }
}

fn element_list(value: Value) -> DriverResult<Vec<Element>> {
    let Value::Array(items) = value else {
        return Err(DriverError::Malformed(format!("expected element list, got {value}")));
    };
    items
        .iter()
        .map(|item| {
            item.get(ELEMENT_KEY)
                .and_then(Value::as_str)
                .map(|id| Element(id.to_string()))
                .ok_or_else(|| DriverError::Malformed(format!("element reference: {item}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_flag_and_locale() {
        let caps = capabilities(true);
        let opts = &caps["capabilities"]["alwaysMatch"]["goog:chromeOptions"];
        let args: Vec<&str> = opts["args"].as_array().unwrap().iter().filter_map(Value::as_str).collect();
        assert_eq!(args[0], "--headless=new");
        assert!(args.contains(&"--lang=vi"));
        assert!(args.iter().any(|a| a.starts_with("--user-agent=Mozilla/5.0")));
        assert_eq!(opts["prefs"]["intl.accept_languages"], "vi,en");

        let visible = capabilities(false);
        let args = visible["capabilities"]["alwaysMatch"]["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(!args.iter().any(|a| a == "--headless=new"));
    }

    #[test]
    fn parses_element_references() {
        let value = json!([{ ELEMENT_KEY: "a1" }, { ELEMENT_KEY: "b2" }]);
        assert_eq!(
            element_list(value).unwrap(),
            vec![Element("a1".into()), Element("b2".into())]
        );
        assert!(element_list(json!([{ "x": 1 }])).is_err());
        assert!(element_list(json!("nope")).is_err());
    }
}
