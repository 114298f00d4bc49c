//! Scraping the Los Angeles Times search results.
//!
//! Layered bottom-up, each layer written against the
//! [`crate::driver::BrowserDriver`] trait so it runs the same against a real
//! browser or the in-memory mock:
//!
//! | Module | Role |
//! |--------|------|
//! | [`latimes`] | Single page interactions: search, filter, sort, next page |
//! | [`fetcher`] | Fetches the visible result items and checks them for staleness |
//! | [`parser`] | Turns one result item into an [`crate::models::Article`] |
//! | [`pagination`] | The state machine tying the above together |
//!
//! Failures on a single result are logged and skipped; failures of the
//! page itself (timeouts, a session error, a page that never stops
//! re-rendering) end the scrape.

pub mod fetcher;
pub mod latimes;
pub mod pagination;
pub mod parser;
