//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. CORS (configured origins, credentials allowed)
//! 3. `TraceLayer` (request span with method, uri, status, latency)
//! 4. Request ID (record `x-request-id` in the span, echo it back)
//! 5. Session layer (tower-sessions with `PostgreSQL` store)
//! 6. Rate limiting on login/registration (governor)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use auth::{OptionalAuth, RequireAuth, clear_current_user, set_current_user};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
