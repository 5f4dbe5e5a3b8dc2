/// Router Module Index
///
/// Routes are grouped by the access they require. Every protected group exports its
/// `GateRequest` next to its router, and `create_router` wraps the group in the access
/// gate with it, so a page cannot be mounted without its requirements.

/// Pages and endpoints open to anonymous visitors (sign-in pages, landing pages).
pub mod public;

/// JSON endpoints used by the front end.
pub mod api;

/// Pages for any signed-in account.
pub mod learner;

/// Exam content reserved for paying subscribers.
pub mod premium;

/// Manager back office.
pub mod manager;

/// Administration, ADMIN role only.
pub mod admin;
