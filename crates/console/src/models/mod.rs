//! Domain models for the console.

pub mod session;

pub use session::{ChannelId, CurrentUser, keys as session_keys};
