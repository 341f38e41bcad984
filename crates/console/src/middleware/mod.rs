//! HTTP middleware and extractors for the console.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing with status and latency)
//! 3. Session layer (tower-sessions with a moka store)
//! 4. Route guard (`RequireAuth` / `RequireAdmin` extractors per handler)

pub mod auth;
pub mod session;

pub use auth::{AuthContext, RequireAdmin, RequireAuth, Visitor};
pub use session::create_session_layer;
