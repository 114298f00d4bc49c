//! Browser automation seam.
//!
//! The scraper never talks to a browser directly; it drives a
//! [`BrowserDriver`]. Production runs use [`webdriver::WebDriverSession`]
//! (a chromedriver session through `thirtyfour`); tests use a scripted
//! in-memory driver.
//!
//! Every wait is bounded by a timeout and fails with
//! [`DriverError::Timeout`]. Elements that disappear because the page
//! re-rendered surface as [`DriverError::Stale`].

use crate::error::DriverError;
use std::fmt;
use std::path::Path;
use std::time::Duration;

#[cfg(test)]
pub mod mock;
pub mod webdriver;

/// Operations the scraper needs from a browser session.
///
/// Element handles are opaque; they are only meaningful to the driver that
/// produced them and may go stale at any time.
pub trait BrowserDriver {
    type Element: Clone + fmt::Debug;

    /// Load `url` in the current tab.
    async fn goto(&self, url: &str) -> Result<(), DriverError>;

    /// Wait until the first element matching `selector` is displayed.
    async fn wait_visible(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Self::Element, DriverError>;

    /// Wait until at least one element matching `selector` is displayed; returns the displayed matches.
    async fn wait_all_visible(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Vec<Self::Element>, DriverError>;

    /// Wait until `element` is detached from the document.
    async fn wait_stale(&self, element: &Self::Element, timeout: Duration)
    -> Result<(), DriverError>;

    /// All elements currently matching `selector`, without waiting.
    async fn find_all(&self, selector: &str) -> Result<Vec<Self::Element>, DriverError>;

    /// First descendant of `parent` matching `selector`.
    async fn find_child(
        &self,
        parent: &Self::Element,
        selector: &str,
    ) -> Result<Self::Element, DriverError>;

    /// Choose the option of the `<select>` element whose visible text is `text`.
    async fn select_by_text(&self, select: &Self::Element, text: &str) -> Result<(), DriverError>;

    async fn click(&self, element: &Self::Element) -> Result<(), DriverError>;

    async fn send_keys(&self, element: &Self::Element, text: &str) -> Result<(), DriverError>;

    /// Submit the form `element` belongs to.
    async fn submit(&self, element: &Self::Element) -> Result<(), DriverError>;

    /// Rendered text of `element`.
    async fn text(&self, element: &Self::Element) -> Result<String, DriverError>;

    /// DOM attribute as written in the markup.
    async fn attribute(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> Result<Option<String>, DriverError>;

    /// Live DOM property, e.g. `textContent` of a hidden label.
    async fn property(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> Result<Option<String>, DriverError>;

    /// Fails with [`DriverError::Stale`] when the element is gone.
    async fn is_enabled(&self, element: &Self::Element) -> Result<bool, DriverError>;

    /// Save a PNG of `element` to `path`.
    async fn screenshot(&self, element: &Self::Element, path: &Path) -> Result<(), DriverError>;

    /// End the session and release the browser.
    async fn quit(self) -> Result<(), DriverError>;
}
