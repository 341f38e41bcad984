//! Presentational view types for templates.
//!
//! Nothing here talks to the network; handlers build these from backend
//! data and hand them to askama templates.

pub mod options;
pub mod pagination;

pub use options::{
    Badge, SelectOption, assignee_options, page_size_options, priority_options, role_options,
    status_options,
};
pub use pagination::{PageLink, PaginationView};
