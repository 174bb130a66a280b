//! Cursor-based product list pagination.
//!
//! [`ListRequest`] is the stateless form of one list action, as posted to
//! `POST /app/products`. [`ProductPaginator`] is the stateful side: it owns the
//! displayed page, the committed search term and sort order, and decides which
//! navigation actions may be issued at all.

use serde::{Deserialize, Serialize};
use shopdesk_core::{SortConfig, SortParseError};
use thiserror::Error;

use crate::shopify::admin::queries::list_products;
use crate::shopify::{AdminShopifyError, PageInfo, ProductPage, ProductSummary};

/// Records per page.
pub const DEFAULT_PAGE_SIZE: i64 = 5;

/// Errors from a list action.
#[derive(Debug, Error)]
pub enum ListError {
    #[error("Cursor is required for {0}")]
    MissingCursor(PageAction),

    #[error("Invalid actionType: {0}")]
    InvalidAction(String),

    #[error(transparent)]
    InvalidSort(#[from] SortParseError),

    #[error(transparent)]
    Shopify(#[from] AdminShopifyError),
}

/// Navigation action carried by a list request (`actionType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageAction {
    /// Restart from the first page (search or sort change).
    #[default]
    Search,
    /// Page following the current one.
    LoadMore,
    /// Page preceding the current one.
    LoadPrevious,
}

impl PageAction {
    /// Wire name (`search`, `loadMore`, `loadPrevious`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::LoadMore => "loadMore",
            Self::LoadPrevious => "loadPrevious",
        }
    }
}

impl std::fmt::Display for PageAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PageAction {
    type Err = ListError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "search" => Ok(Self::Search),
            "loadMore" => Ok(Self::LoadMore),
            "loadPrevious" => Ok(Self::LoadPrevious),
            other => Err(ListError::InvalidAction(other.to_string())),
        }
    }
}

/// Shopify search syntax for a title substring match. Empty terms filter
/// nothing.
#[must_use]
pub fn title_filter(term: &str) -> Option<String> {
    if term.is_empty() {
        None
    } else {
        Some(format!("title:*{term}*"))
    }
}

/// One list action: what to search, how to sort, where to page from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub action: PageAction,
    pub search_query: String,
    pub cursor: Option<String>,
    pub sort: SortConfig,
}

impl ListRequest {
    /// First page for a search/sort combination.
    #[must_use]
    pub fn first_page(search_query: impl Into<String>, sort: SortConfig) -> Self {
        Self {
            action: PageAction::Search,
            search_query: search_query.into(),
            cursor: None,
            sort,
        }
    }

    /// GraphQL variables for this action.
    ///
    /// `search` always starts from the first page, ignoring any cursor.
    /// `loadPrevious` sends only `last`/`before`.
    ///
    /// # Errors
    ///
    /// Returns `ListError::MissingCursor` when a navigation action carries no
    /// cursor.
    pub fn variables(&self, page_size: i64) -> Result<list_products::Variables, ListError> {
        let cursor = || {
            self.cursor
                .clone()
                .filter(|c| !c.is_empty())
                .ok_or(ListError::MissingCursor(self.action))
        };
        let window = match self.action {
            PageAction::Search => Window::First,
            PageAction::LoadMore => Window::After(cursor()?),
            PageAction::LoadPrevious => Window::Before(cursor()?),
        };
        Ok(window_variables(&self.search_query, self.sort, page_size, window))
    }
}

enum Window {
    First,
    After(String),
    Before(String),
}

fn window_variables(
    search_query: &str,
    sort: SortConfig,
    page_size: i64,
    window: Window,
) -> list_products::Variables {
    let mut variables = list_products::Variables {
        first: Some(page_size),
        last: None,
        after: None,
        before: None,
        query: title_filter(search_query),
        sort_key: sort.key,
        reverse: sort.direction.is_reverse(),
    };
    match window {
        Window::First => {}
        Window::After(cursor) => variables.after = Some(cursor),
        Window::Before(cursor) => {
            variables.first = None;
            variables.last = Some(page_size);
            variables.before = Some(cursor);
        }
    }
    variables
}

/// Paginator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaginatorState {
    #[default]
    Idle,
    Loading,
    Error,
}

/// A list request issued by the paginator.
///
/// `seq` identifies the request; only the latest one may update the
/// paginator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub seq: u64,
    pub request: ListRequest,
    pub variables: list_products::Variables,
}

/// Product list pagination state machine.
#[derive(Debug, Clone)]
pub struct ProductPaginator {
    page_size: i64,
    search_query: String,
    sort: SortConfig,
    products: Vec<ProductSummary>,
    page_info: PageInfo,
    state: PaginatorState,
    error: Option<String>,
    seq: u64,
    in_flight: Option<u64>,
}

impl Default for ProductPaginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl ProductPaginator {
    /// Idle paginator with no search filter, sorted by title ascending.
    #[must_use]
    pub fn new(page_size: i64) -> Self {
        Self {
            page_size,
            search_query: String::new(),
            sort: SortConfig::default(),
            products: Vec::new(),
            page_info: PageInfo::default(),
            state: PaginatorState::Idle,
            error: None,
            seq: 0,
            in_flight: None,
        }
    }

    /// Seed with a page fetched elsewhere (the initial loader).
    #[must_use]
    pub fn with_page(mut self, page: ProductPage) -> Self {
        self.products = page.products;
        self.page_info = page.page_info;
        self
    }

    #[must_use]
    pub const fn state(&self) -> PaginatorState {
        self.state
    }

    #[must_use]
    pub fn products(&self) -> &[ProductSummary] {
        &self.products
    }

    #[must_use]
    pub const fn page_info(&self) -> &PageInfo {
        &self.page_info
    }

    /// Message of the last failure, while in the `Error` state.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Committed search term.
    #[must_use]
    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    #[must_use]
    pub const fn sort(&self) -> SortConfig {
        self.sort
    }

    #[must_use]
    pub const fn page_size(&self) -> i64 {
        self.page_size
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state == PaginatorState::Loading
    }

    /// Whether "next page" is enabled.
    #[must_use]
    pub fn can_load_more(&self) -> bool {
        !self.is_loading() && self.page_info.next_cursor().is_some()
    }

    /// Whether "previous page" is enabled.
    #[must_use]
    pub fn can_load_previous(&self) -> bool {
        !self.is_loading() && self.page_info.previous_cursor().is_some()
    }

    /// Search with the current sort order, from the first page.
    pub fn search(&mut self, term: &str) -> PageRequest {
        self.search_and_sort(term, self.sort)
    }

    /// Re-sort with the current search term, from the first page.
    pub fn sort_by(&mut self, sort: SortConfig) -> PageRequest {
        let term = self.search_query.clone();
        self.search_and_sort(&term, sort)
    }

    /// Apply a search term and sort order together as one request.
    ///
    /// Supersedes any request in flight.
    pub fn search_and_sort(&mut self, term: &str, sort: SortConfig) -> PageRequest {
        self.search_query = term.to_string();
        self.sort = sort;
        let variables = window_variables(term, sort, self.page_size, Window::First);
        self.begin(ListRequest::first_page(term, sort), variables)
    }

    /// Request the next page. `None` when there is no next page or a request
    /// is already in flight.
    pub fn load_more(&mut self) -> Option<PageRequest> {
        if !self.can_load_more() {
            return None;
        }
        let cursor = self.page_info.next_cursor().map(str::to_string);
        self.navigate(PageAction::LoadMore, cursor)
    }

    /// Request the previous page. `None` when there is no previous page or a
    /// request is already in flight.
    pub fn load_previous(&mut self) -> Option<PageRequest> {
        if !self.can_load_previous() {
            return None;
        }
        let cursor = self.page_info.previous_cursor().map(str::to_string);
        self.navigate(PageAction::LoadPrevious, cursor)
    }

    /// Apply a successful response, replacing the list and page info.
    ///
    /// Returns `false` for a response to a superseded request, which is
    /// dropped.
    pub fn on_response(&mut self, seq: u64, page: ProductPage) -> bool {
        if !self.settle(seq) {
            return false;
        }
        self.products = page.products;
        self.page_info = page.page_info;
        self.state = PaginatorState::Idle;
        self.error = None;
        true
    }

    /// Record a failed request. The previously displayed page stays.
    ///
    /// Returns `false` for a failure of a superseded request.
    pub fn on_failure(&mut self, seq: u64, message: impl Into<String>) -> bool {
        if !self.settle(seq) {
            return false;
        }
        self.state = PaginatorState::Error;
        self.error = Some(message.into());
        true
    }

    fn navigate(&mut self, action: PageAction, cursor: Option<String>) -> Option<PageRequest> {
        let request = ListRequest {
            action,
            search_query: self.search_query.clone(),
            cursor,
            sort: self.sort,
        };
        let variables = request.variables(self.page_size).ok()?;
        Some(self.begin(request, variables))
    }

    fn begin(&mut self, request: ListRequest, variables: list_products::Variables) -> PageRequest {
        self.seq += 1;
        self.in_flight = Some(self.seq);
        self.state = PaginatorState::Loading;
        PageRequest {
            seq: self.seq,
            request,
            variables,
        }
    }

    fn settle(&mut self, seq: u64) -> bool {
        if self.in_flight != Some(seq) {
            tracing::debug!(seq, current = ?self.in_flight, "Dropping superseded page response");
            return false;
        }
        self.in_flight = None;
        true
    }
}
