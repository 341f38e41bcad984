//! Stateful services shared across handlers.
//!
//! # Services
//!
//! - `list_views` - Last-request-wins retention of list pages per session

pub mod list_views;

pub use list_views::{ListViews, Ticket};
