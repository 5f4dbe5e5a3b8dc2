use crate::{
    AppState,
    gate::GateRequest,
    handlers::{Page, page},
    models::Role,
};
use axum::Router;

pub const DASHBOARD: Page = Page {
    name: "manager-dashboard",
    title_fr: "Tableau de bord",
    title_en: "Dashboard",
};

/// Managers of either grade, and admins.
pub fn gate_request() -> GateRequest {
    GateRequest::new().roles([Role::JuniorManager, Role::SeniorManager, Role::Admin])
}

/// Manager Router Module
///
/// `/manager` itself is the manager sign-in page and lives in the public router.
pub fn manager_routes() -> Router<AppState> {
    Router::new().route("/manager/dashboard", page(DASHBOARD))
}
