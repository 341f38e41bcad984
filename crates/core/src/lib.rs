//! Enquiry Desk Core - Shared domain types.
//!
//! This crate provides the types the console and its tests share:
//! - enquiries, their status/priority enums and update payloads
//! - console users and roles
//! - list filter state with its URL query codec and pagination metadata
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no session state. Everything here can be unit-tested in isolation.
//!
//! # Modules
//!
//! - [`types`] - IDs, emails, enums, records, payloads, and filter state

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
