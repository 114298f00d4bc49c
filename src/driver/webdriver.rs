//! [`BrowserDriver`] backed by a chromedriver session.
//!
//! Waits go through thirtyfour's element queries and waiters, polling at the
//! configured interval until the condition holds or the timeout elapses.

use super::BrowserDriver;
use crate::error::DriverError;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use thirtyfour::components::SelectElement;
use thirtyfour::fantoccini::error::CmdError;
use thirtyfour::prelude::*;
use tracing::{debug, info, instrument};

/// WebDriver code point for the Enter key.
const ENTER: &str = "\u{e007}";

/// Classify a W3C WebDriver error code.
///
/// chromedriver reports some stale references as "no such element", so the
/// message is checked as well.
fn from_status(code: &str, message: String) -> DriverError {
    match code {
        "stale element reference" => DriverError::Stale(message),
        "element click intercepted" => DriverError::ClickIntercepted(message),
        "no such element" if message.contains("stale element") => DriverError::Stale(message),
        "no such element" => DriverError::NotFound(message),
        _ => DriverError::Session(message),
    }
}

impl From<WebDriverError> for DriverError {
    fn from(e: WebDriverError) -> Self {
        let message = e.to_string();
        match &e {
            WebDriverError::NoSuchElement(_) => from_status("no such element", message),
            WebDriverError::CmdError(CmdError::Standard(status)) => from_status(status.error(), message),
            _ => DriverError::Session(message),
        }
    }
}

/// A failed wait: an empty query result or an expired waiter is a timeout.
fn wait_failed(e: WebDriverError, condition: String, timeout: Duration) -> DriverError {
    match e {
        WebDriverError::NoSuchElement(_) | WebDriverError::Timeout(_) => {
            DriverError::Timeout { condition, timeout }
        }
        other => other.into(),
    }
}

/// A live chromedriver session.
pub struct WebDriverSession {
    driver: WebDriver,
    poll_interval: Duration,
}

impl fmt::Debug for WebDriverSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebDriverSession")
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl WebDriverSession {
    /// Start a Chrome session on the chromedriver listening at `server_url`.
    #[instrument(level = "info", skip(poll_interval))]
    pub async fn connect(
        server_url: &str,
        headless: bool,
        poll_interval: Duration,
    ) -> Result<Self, DriverError> {
        let mut args = vec![
            "--no-sandbox",
            "--disable-extensions",
            "--disable-gpu",
            "--disable-dev-shm-usage",
            "--start-maximized",
            "--window-size=1920,1080",
            "--disable-blink-features=AutomationControlled",
        ];
        if headless {
            args.push("--headless=new");
        }

        let mut caps = DesiredCapabilities::chrome();
        caps.add_chrome_option("args", args)?;
        caps.add_chrome_option("excludeSwitches", vec!["enable-logging"])?;

        let driver = WebDriver::new(server_url, caps).await?;
        info!("WebDriver session started");
        Ok(Self {
            driver,
            poll_interval,
        })
    }
}

impl BrowserDriver for WebDriverSession {
    type Element = WebElement;

    #[instrument(level = "debug", skip(self))]
    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        self.driver.goto(url).await?;
        Ok(())
    }

    async fn wait_visible(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<WebElement, DriverError> {
        self.driver
            .query(By::Css(selector))
            .and_displayed()
            .wait(timeout, self.poll_interval)
            .first()
            .await
            .map_err(|e| wait_failed(e, format!("visibility of {selector}"), timeout))
    }

    async fn wait_all_visible(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Vec<WebElement>, DriverError> {
        self.driver
            .query(By::Css(selector))
            .and_displayed()
            .wait(timeout, self.poll_interval)
            .all_required()
            .await
            .map_err(|e| wait_failed(e, format!("visibility of {selector}"), timeout))
    }

    async fn wait_stale(&self, element: &WebElement, timeout: Duration) -> Result<(), DriverError> {
        element
            .wait_until()
            .wait(timeout, self.poll_interval)
            .stale()
            .await
            .map_err(|e| wait_failed(e, "staleness of element".to_string(), timeout))?;
        debug!("Element went stale");
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<WebElement>, DriverError> {
        Ok(self.driver.find_all(By::Css(selector)).await?)
    }

    async fn find_child(&self, parent: &WebElement, selector: &str) -> Result<WebElement, DriverError> {
        Ok(parent.find(By::Css(selector)).await?)
    }

    async fn select_by_text(&self, select: &WebElement, text: &str) -> Result<(), DriverError> {
        SelectElement::new(select)
            .await?
            .select_by_visible_text(text)
            .await?;
        Ok(())
    }

    async fn click(&self, element: &WebElement) -> Result<(), DriverError> {
        element.click().await?;
        Ok(())
    }

    async fn send_keys(&self, element: &WebElement, text: &str) -> Result<(), DriverError> {
        element.send_keys(text).await?;
        Ok(())
    }

    async fn submit(&self, element: &WebElement) -> Result<(), DriverError> {
        element.send_keys(ENTER).await?;
        Ok(())
    }

    async fn text(&self, element: &WebElement) -> Result<String, DriverError> {
        Ok(element.text().await?)
    }

    async fn attribute(&self, element: &WebElement, name: &str) -> Result<Option<String>, DriverError> {
        Ok(element.attr(name).await?)
    }

    async fn property(&self, element: &WebElement, name: &str) -> Result<Option<String>, DriverError> {
        Ok(element.prop(name).await?)
    }

    async fn is_enabled(&self, element: &WebElement) -> Result<bool, DriverError> {
        Ok(element.is_enabled().await?)
    }

    async fn screenshot(&self, element: &WebElement, path: &Path) -> Result<(), DriverError> {
        element.screenshot(path).await?;
        Ok(())
    }

    async fn quit(self) -> Result<(), DriverError> {
        self.driver.quit().await?;
        info!("WebDriver session closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_map_to_driver_errors() {
        let cases = [
            ("stale element reference", "gone"),
            ("element click intercepted", "covered"),
            ("no such element", "missing"),
            ("no such element", "stale element not found in the current frame"),
            ("invalid session id", "closed"),
        ];
        let mapped: Vec<_> = cases
            .iter()
            .map(|(code, message)| from_status(code, message.to_string()))
            .collect();

        assert!(mapped[0].is_stale());
        assert!(matches!(mapped[1], DriverError::ClickIntercepted(_)));
        assert!(matches!(mapped[2], DriverError::NotFound(_)));
        assert!(mapped[3].is_stale());
        assert!(matches!(mapped[4], DriverError::Session(_)));
    }

    #[test]
    fn test_thirtyfour_errors_convert() {
        let missing = DriverError::from(WebDriverError::NoSuchElement("div.x".to_string()));
        assert!(matches!(missing, DriverError::NotFound(m) if m.contains("div.x")));

        let stale = DriverError::from(WebDriverError::NoSuchElement(
            "stale element reference: element is not attached".to_string(),
        ));
        assert!(stale.is_stale());

        let other = DriverError::from(WebDriverError::CustomError("boom".to_string()));
        assert_eq!(other, DriverError::Session("boom".to_string()));
    }

    #[test]
    fn test_failed_waits_become_timeouts() {
        let timeout = Duration::from_secs(2);
        let empty = wait_failed(
            WebDriverError::NoSuchElement("li".to_string()),
            "visibility of li".to_string(),
            timeout,
        );
        assert_eq!(
            empty,
            DriverError::Timeout {
                condition: "visibility of li".to_string(),
                timeout
            }
        );

        let expired = wait_failed(
            WebDriverError::Timeout("still present".to_string()),
            "staleness of element".to_string(),
            timeout,
        );
        assert!(matches!(expired, DriverError::Timeout { .. }));

        let broken = wait_failed(
            WebDriverError::CustomError("session lost".to_string()),
            "visibility of li".to_string(),
            timeout,
        );
        assert!(matches!(broken, DriverError::Session(_)));
    }
}
