//! Pagination controls for the enquiry list.

use enquiry_desk_core::{EnquiryFilter, Pagination};

/// One numbered page control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub number: u32,
    pub href: String,
    pub current: bool,
}

/// Everything the pagination partial renders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PaginationView {
    /// False when there is at most one page: render nothing.
    pub visible: bool,
    /// "Showing X to Y of Z results"; empty when the page holds no rows.
    pub summary: String,
    /// Previous-page link, `None` when disabled.
    pub prev: Option<String>,
    /// Next-page link, `None` when disabled.
    pub next: Option<String>,
    pub pages: Vec<PageLink>,
}

impl PaginationView {
    /// Build controls for `pagination`; links keep every field of `filter`
    /// except the page.
    #[must_use]
    pub fn new(pagination: &Pagination, filter: &EnquiryFilter) -> Self {
        if !pagination.has_controls() {
            return Self::default();
        }
        let href = |page: u32| filter.clone().with_page(page).list_path();

        Self {
            visible: true,
            summary: match pagination.first_item() {
                0 => String::new(),
                first => format!(
                    "Showing {first} to {} of {} results",
                    pagination.last_item(),
                    pagination.total
                ),
            },
            prev: pagination
                .has_previous()
                .then(|| href(pagination.page - 1)),
            next: pagination.has_next().then(|| href(pagination.page + 1)),
            pages: pagination
                .page_numbers()
                .map(|number| PageLink {
                    number,
                    href: href(number),
                    current: number == pagination.page,
                })
                .collect(),
        }
    }
}
