//! HTTP surface: caller identification, response construction, the
//! handler-wrapping middleware, and the decision service endpoints.

mod identity;
mod middleware;
mod respond;
mod server;
mod service;

pub use identity::{client_identifier, FALLBACK_IDENTIFIER};
pub use middleware::{enforce, RateLimitState};
pub use respond::{set_quota_headers, too_many_requests, LIMIT_HEADER, REMAINING_HEADER, RESET_HEADER};
pub use server::HttpServer;
pub use service::{check, health, AppState, CheckRequest};
