//! Scripted in-memory [`BrowserDriver`] for tests.
//!
//! Models the search page as a list of result pages. Each fetch of the
//! result list can be scripted to contain a stale element, either one that
//! fails the enabled check or one that fails while its fields are read.

use super::BrowserDriver;
use crate::config::Selectors;
use crate::error::DriverError;
use chrono::{DateTime, Utc};
use std::cell::{Cell, Ref, RefCell};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

/// Visible texts of the sort dropdown.
const SORT_OPTIONS: [&str; 3] = ["Relevance", "Newest", "Oldest"];

#[derive(Debug, Clone, Default)]
pub struct MockArticle {
    pub title: Option<String>,
    pub description: Option<String>,
    pub timestamp: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
}

impl MockArticle {
    pub fn new(title: &str, published_at: DateTime<Utc>) -> Self {
        Self {
            title: Some(title.to_string()),
            description: Some(format!("About {title}")),
            timestamp: Some(published_at.timestamp_millis().to_string()),
            ..Self::default()
        }
    }

    pub fn undated(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            description: Some(format!("About {title}")),
            ..Self::default()
        }
    }

    pub fn without_description(mut self) -> Self {
        self.description = None;
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn with_image(mut self, src: &str) -> Self {
        self.image = Some(src.to_string());
        self
    }
}

/// A stale element planted in one fetch of the result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The item at this index fails the enabled check.
    StaleOnCheck(usize),
    /// The item at this index fails when its fields are read.
    StaleOnRead(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Category,
    Title,
    Description,
    Timestamp,
    Image,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockElement {
    SearchIcon,
    SearchInput,
    SeeAllCategories,
    CategoryLabel(usize),
    FiltersSelected,
    ResultsMenu { sorted: bool },
    SortSelect,
    Result {
        page: usize,
        index: usize,
        fault: Option<Fault>,
    },
    Field {
        page: usize,
        index: usize,
        field: Field,
    },
    NextPage { inactive: bool },
    NextPageIcon { inactive: bool },
}

/// What the scraper did to the mock, for assertions.
#[derive(Debug, Default)]
pub struct MockState {
    /// Zero-based index of the page on screen.
    pub current_page: usize,
    /// One-based numbers of every page displayed, in order.
    pub pages_shown: Vec<usize>,
    pub result_fetches: usize,
    pub visited: Vec<String>,
    pub typed: Vec<String>,
    pub submitted: bool,
    pub sorted: bool,
    pub selected_category: Option<String>,
    pub screenshots: Vec<PathBuf>,
    faults: HashMap<usize, VecDeque<Fault>>,
}

pub struct MockDriver {
    selectors: Selectors,
    pages: Vec<Vec<MockArticle>>,
    categories: Vec<String>,
    inactive_last_page: bool,
    intercept_next_page: bool,
    state: RefCell<MockState>,
    quit: Rc<Cell<bool>>,
}

impl MockDriver {
    pub fn new(pages: Vec<Vec<MockArticle>>) -> Self {
        Self {
            selectors: Selectors::default(),
            pages,
            categories: Vec::new(),
            inactive_last_page: false,
            intercept_next_page: false,
            state: RefCell::new(MockState::default()),
            quit: Rc::new(Cell::new(false)),
        }
    }

    pub fn with_categories(mut self, categories: &[&str]) -> Self {
        self.categories = categories.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Plant `fault` in the next not-yet-faulted fetch of one-based `page`.
    pub fn with_fault(self, page: usize, fault: Fault) -> Self {
        self.state
            .borrow_mut()
            .faults
            .entry(page - 1)
            .or_default()
            .push_back(fault);
        self
    }

    /// Show a disabled next-page control on the last page instead of none.
    pub fn with_inactive_next_on_last_page(mut self) -> Self {
        self.inactive_last_page = true;
        self
    }

    pub fn with_intercepted_next_page(mut self) -> Self {
        self.intercept_next_page = true;
        self
    }

    pub fn state(&self) -> Ref<'_, MockState> {
        self.state.borrow()
    }

    /// Flag set once the session is quit; outlives the driver.
    pub fn quit_handle(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.quit)
    }

    fn timeout(selector: &str, timeout: Duration) -> DriverError {
        DriverError::Timeout {
            condition: format!("visibility of {selector}"),
            timeout,
        }
    }

    fn field_for(&self, selector: &str) -> Option<Field> {
        let s = &self.selectors;
        [
            (&s.category, Field::Category),
            (&s.title, Field::Title),
            (&s.description, Field::Description),
            (&s.timestamp, Field::Timestamp),
            (&s.image, Field::Image),
        ]
        .into_iter()
        .find(|(sel, _)| sel.as_str() == selector)
        .map(|(_, field)| field)
    }

    fn field_value(&self, page: usize, index: usize, field: Field) -> Option<String> {
        let article = self.pages.get(page)?.get(index)?;
        match field {
            Field::Category => article.category.clone(),
            Field::Title => article.title.clone(),
            Field::Description => article.description.clone(),
            Field::Timestamp => article.timestamp.clone(),
            Field::Image => article.image.clone(),
        }
    }
}

impl BrowserDriver for MockDriver {
    type Element = MockElement;

    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        self.state.borrow_mut().visited.push(url.to_string());
        Ok(())
    }

    async fn wait_visible(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<MockElement, DriverError> {
        let s = &self.selectors;
        let state = self.state.borrow();
        if selector == s.search_icon {
            Ok(MockElement::SearchIcon)
        } else if selector == s.search_input {
            Ok(MockElement::SearchInput)
        } else if selector == s.see_all_categories {
            Ok(MockElement::SeeAllCategories)
        } else if selector == s.filters_selected && state.selected_category.is_some() {
            Ok(MockElement::FiltersSelected)
        } else if selector == s.results_menu && state.submitted {
            Ok(MockElement::ResultsMenu {
                sorted: state.sorted,
            })
        } else if selector == s.sort_select {
            Ok(MockElement::SortSelect)
        } else {
            Err(Self::timeout(selector, timeout))
        }
    }

    async fn wait_all_visible(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Vec<MockElement>, DriverError> {
        let s = &self.selectors;
        if selector == s.category_labels && !self.categories.is_empty() {
            return Ok((0..self.categories.len())
                .map(MockElement::CategoryLabel)
                .collect());
        }
        if selector != s.result_items {
            return Err(Self::timeout(selector, timeout));
        }

        let mut state = self.state.borrow_mut();
        let page = state.current_page;
        let count = self.pages.get(page).map_or(0, Vec::len);
        if !state.submitted || count == 0 {
            return Err(Self::timeout(selector, timeout));
        }
        state.result_fetches += 1;
        let fault = state.faults.get_mut(&page).and_then(VecDeque::pop_front);
        Ok((0..count)
            .map(|index| MockElement::Result { page, index, fault })
            .collect())
    }

    async fn wait_stale(&self, element: &MockElement, timeout: Duration) -> Result<(), DriverError> {
        match element {
            MockElement::ResultsMenu { sorted: false } if self.state.borrow().sorted => Ok(()),
            _ => Err(DriverError::Timeout {
                condition: "staleness of element".to_string(),
                timeout,
            }),
        }
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<MockElement>, DriverError> {
        if selector != self.selectors.next_page {
            return Ok(Vec::new());
        }
        let current = self.state.borrow().current_page;
        if current + 1 < self.pages.len() {
            Ok(vec![MockElement::NextPage { inactive: false }])
        } else if self.inactive_last_page {
            Ok(vec![MockElement::NextPage { inactive: true }])
        } else {
            Ok(Vec::new())
        }
    }

    async fn find_child(&self, parent: &MockElement, selector: &str) -> Result<MockElement, DriverError> {
        match parent {
            MockElement::Result { page, index, fault } => {
                if *fault == Some(Fault::StaleOnRead(*index)) {
                    return Err(DriverError::Stale(format!("result {index}")));
                }
                let field = self
                    .field_for(selector)
                    .ok_or_else(|| DriverError::NotFound(selector.to_string()))?;
                self.field_value(*page, *index, field)
                    .map(|_| MockElement::Field {
                        page: *page,
                        index: *index,
                        field,
                    })
                    .ok_or_else(|| DriverError::NotFound(selector.to_string()))
            }
            MockElement::NextPage { inactive } if selector == self.selectors.next_page_icon => {
                Ok(MockElement::NextPageIcon {
                    inactive: *inactive,
                })
            }
            _ => Err(DriverError::NotFound(selector.to_string())),
        }
    }

    async fn click(&self, element: &MockElement) -> Result<(), DriverError> {
        let mut state = self.state.borrow_mut();
        match element {
            MockElement::CategoryLabel(i) => {
                state.selected_category = Some(self.categories[*i].trim().to_string());
            }
            MockElement::NextPage { inactive: false } => {
                if self.intercept_next_page {
                    return Err(DriverError::ClickIntercepted("overlay".to_string()));
                }
                state.current_page += 1;
                let shown = state.current_page + 1;
                state.pages_shown.push(shown);
            }
            _ => {}
        }
        Ok(())
    }

    async fn select_by_text(&self, select: &MockElement, text: &str) -> Result<(), DriverError> {
        if *select != MockElement::SortSelect || !SORT_OPTIONS.contains(&text) {
            return Err(DriverError::NotFound(format!("option \"{text}\"")));
        }
        if text == self.selectors.sort_newest_text {
            self.state.borrow_mut().sorted = true;
        }
        Ok(())
    }

    async fn send_keys(&self, _element: &MockElement, text: &str) -> Result<(), DriverError> {
        self.state.borrow_mut().typed.push(text.to_string());
        Ok(())
    }

    async fn submit(&self, _element: &MockElement) -> Result<(), DriverError> {
        let mut state = self.state.borrow_mut();
        state.submitted = true;
        state.pages_shown = vec![1];
        Ok(())
    }

    async fn text(&self, element: &MockElement) -> Result<String, DriverError> {
        match element {
            MockElement::Field { page, index, field } => {
                Ok(self.field_value(*page, *index, *field).unwrap_or_default())
            }
            _ => Ok(String::new()),
        }
    }

    async fn attribute(&self, element: &MockElement, name: &str) -> Result<Option<String>, DriverError> {
        Ok(match (element, name) {
            (
                MockElement::Field {
                    page,
                    index,
                    field: field @ (Field::Timestamp | Field::Image),
                },
                "data-timestamp" | "src",
            ) => self.field_value(*page, *index, *field),
            (MockElement::NextPageIcon { inactive: true }, "data-inactive") => Some("true".to_string()),
            _ => None,
        })
    }

    async fn property(&self, element: &MockElement, name: &str) -> Result<Option<String>, DriverError> {
        Ok(match (element, name) {
            (MockElement::CategoryLabel(i), "textContent") => Some(format!("\n  {}  ", self.categories[*i])),
            _ => None,
        })
    }

    async fn is_enabled(&self, element: &MockElement) -> Result<bool, DriverError> {
        match element {
            MockElement::Result {
                index,
                fault: Some(Fault::StaleOnCheck(stale)),
                ..
            } if index == stale => Err(DriverError::Stale(format!("result {index}"))),
            _ => Ok(true),
        }
    }

    async fn screenshot(&self, _element: &MockElement, path: &Path) -> Result<(), DriverError> {
        self.state.borrow_mut().screenshots.push(path.to_path_buf());
        Ok(())
    }

    async fn quit(self) -> Result<(), DriverError> {
        self.quit.set(true);
        Ok(())
    }
}
