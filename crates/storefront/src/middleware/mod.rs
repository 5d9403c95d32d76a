//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transactions)
//! 2. `TraceLayer` (request spans)
//! 3. Request ID (`x-request-id`, recorded on the span and Sentry scope)
//! 4. Session layer (tower-sessions; `PostgreSQL` store in production)

pub mod request_id;
pub mod session;

pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use session::{create_session_layer, postgres_session_store};
