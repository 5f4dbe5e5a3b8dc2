use crate::{
    AppState,
    gate::GateRequest,
    handlers::{Page, page},
    models::Role,
};
use axum::Router;

pub const ADMIN_HOME: Page = Page {
    name: "admin",
    title_fr: "Administration",
    title_en: "Administration",
};

pub const USERS: Page = Page {
    name: "admin-users",
    title_fr: "Utilisateurs",
    title_en: "Users",
};

pub fn gate_request() -> GateRequest {
    GateRequest::new().roles([Role::Admin])
}

/// Admin Router Module
///
/// Anonymous visitors are sent to `/admin/login` (inferred from the `/admin` prefix),
/// signed-in non-admins to their own landing page.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin", page(ADMIN_HOME))
        .route("/admin/users", page(USERS))
}
