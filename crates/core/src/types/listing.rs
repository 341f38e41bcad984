//! List filter state, its URL query codec, and backend pagination metadata.
//!
//! The filter state is the single source of truth for what a list page shows.
//! It is mirrored into the page URL (only non-empty, non-default fields) and
//! seeded back from it, so reloading a URL reproduces the same view.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use super::enquiry::Enquiry;
use super::status::{EnquiryStatus, Role};

/// First page (pages are 1-based).
pub const DEFAULT_PAGE: u32 = 1;
/// Page size when the URL does not name one.
pub const DEFAULT_LIMIT: u32 = 10;
/// Largest page size accepted from a URL.
pub const MAX_LIMIT: u32 = 100;
/// Page sizes offered by the filter bar.
pub const PAGE_SIZES: [u32; 4] = [10, 25, 50, 100];

/// Filter and pagination state of the enquiry list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnquiryFilter {
    search: String,
    status: Option<EnquiryStatus>,
    page: u32,
    limit: u32,
}

impl Default for EnquiryFilter {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: None,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl EnquiryFilter {
    /// Seed filter state from a raw URL query string (without the `?`).
    ///
    /// Unknown keys are ignored. `page` and `limit` fall back to their
    /// defaults when absent or unparsable; unknown statuses mean "all".
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut filter = Self::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "search" => filter.search = value.trim().to_owned(),
                "status" => filter.status = value.parse().ok(),
                "page" => filter.page = parse_page(&value),
                "limit" => filter.limit = parse_limit(&value),
                _ => {}
            }
        }
        filter
    }

    /// Serialize to a URL query string, omitting empty and default fields.
    #[must_use]
    pub fn to_query(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if !self.search.is_empty() {
            query.append_pair("search", &self.search);
        }
        if let Some(status) = self.status {
            query.append_pair("status", status.as_str());
        }
        if self.page != DEFAULT_PAGE {
            query.append_pair("page", &self.page.to_string());
        }
        if self.limit != DEFAULT_LIMIT {
            query.append_pair("limit", &self.limit.to_string());
        }
        query.finish()
    }

    /// Query parameters for `GET /api/enquiries`. Page and limit are always
    /// sent; search and status only when set.
    #[must_use]
    pub fn to_api_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(4);
        if !self.search.is_empty() {
            params.push(("search", self.search.clone()));
        }
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_owned()));
        }
        params.push(("page", self.page.to_string()));
        params.push(("limit", self.limit.to_string()));
        params
    }

    /// Path of the enquiry list showing this filter state.
    #[must_use]
    pub fn list_path(&self) -> String {
        with_query("/enquiries", &self.to_query())
    }

    /// Change the search text. Resets to the first page.
    #[must_use]
    pub fn with_search(mut self, search: &str) -> Self {
        search.trim().clone_into(&mut self.search);
        self.page = DEFAULT_PAGE;
        self
    }

    /// Change the status filter. Resets to the first page.
    #[must_use]
    pub const fn with_status(mut self, status: Option<EnquiryStatus>) -> Self {
        self.status = status;
        self.page = DEFAULT_PAGE;
        self
    }

    /// Change the page size. Resets to the first page.
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit.clamp(1, MAX_LIMIT);
        self.page = DEFAULT_PAGE;
        self
    }

    /// Move to another page, leaving every other field untouched.
    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(DEFAULT_PAGE);
        self
    }

    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    #[must_use]
    pub const fn status(&self) -> Option<EnquiryStatus> {
        self.status
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }
}

/// Filter state of the user list (search and role, no pagination).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserFilter {
    search: String,
    role: Option<Role>,
}

impl UserFilter {
    /// Seed filter state from a raw URL query string.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut filter = Self::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "search" => filter.search = value.trim().to_owned(),
                "role" => filter.role = value.parse().ok(),
                _ => {}
            }
        }
        filter
    }

    /// Serialize to a URL query string, omitting empty fields.
    #[must_use]
    pub fn to_query(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if !self.search.is_empty() {
            query.append_pair("search", &self.search);
        }
        if let Some(role) = self.role {
            query.append_pair("role", role.as_str());
        }
        query.finish()
    }

    /// Query parameters for `GET /api/users`.
    #[must_use]
    pub fn to_api_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(2);
        if !self.search.is_empty() {
            params.push(("search", self.search.clone()));
        }
        if let Some(role) = self.role {
            params.push(("role", role.as_str().to_owned()));
        }
        params
    }

    /// Path of the user list showing this filter state.
    #[must_use]
    pub fn list_path(&self) -> String {
        with_query("/users", &self.to_query())
    }

    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    #[must_use]
    pub const fn role(&self) -> Option<Role> {
        self.role
    }
}

/// Pagination metadata returned alongside a page of enquiries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u32,
}

impl Pagination {
    /// Page controls are only shown when there is more than one page.
    #[must_use]
    pub const fn has_controls(&self) -> bool {
        self.pages > 1
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.pages
    }

    /// One entry per page, `1..=pages`.
    #[must_use]
    pub const fn page_numbers(&self) -> RangeInclusive<u32> {
        1..=self.pages
    }

    /// 1-based index of the first row on this page; 0 when the page holds
    /// no rows (empty list, or a page past the last one).
    #[must_use]
    pub fn first_item(&self) -> u64 {
        let first = u64::from(self.page.saturating_sub(1)) * u64::from(self.limit) + 1;
        if first > self.total { 0 } else { first }
    }

    /// 1-based index of the last row on this page; 0 when it holds no rows.
    #[must_use]
    pub fn last_item(&self) -> u64 {
        if self.first_item() == 0 {
            return 0;
        }
        (u64::from(self.page) * u64::from(self.limit)).min(self.total)
    }
}

/// Response of `GET /api/enquiries`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnquiryListing {
    pub enquiries: Vec<Enquiry>,
    pub pagination: Pagination,
}

fn parse_page(value: &str) -> u32 {
    value
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|page| *page >= 1)
        .unwrap_or(DEFAULT_PAGE)
}

fn parse_limit(value: &str) -> u32 {
    value
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|limit| *limit >= 1)
        .map_or(DEFAULT_LIMIT, |limit| limit.min(MAX_LIMIT))
}

fn with_query(path: &str, query: &str) -> String {
    if query.is_empty() {
        path.to_owned()
    } else {
        format!("{path}?{query}")
    }
}
