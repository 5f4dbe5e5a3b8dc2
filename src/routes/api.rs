use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// API Router Module
///
/// JSON endpoints. Not wrapped in the page gate: `/me` authenticates through the
/// `AuthUser` extractor (401 when anonymous) and `/access/evaluate` answers for any
/// session, signed in or not.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // GET /me
        // Profile, role, effective tier and landing page of the caller.
        .route("/me", get(handlers::get_me))
        // POST /access/evaluate
        // Shared gate evaluation for client-side guards.
        .route("/access/evaluate", post(handlers::evaluate_access))
}
