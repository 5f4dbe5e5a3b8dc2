use crate::{
    AppState,
    gate::GateRequest,
    handlers::{Page, page},
};
use axum::Router;

pub const HOME: Page = Page {
    name: "home",
    title_fr: "Accueil",
    title_en: "Home",
};

pub const PRACTICE: Page = Page {
    name: "practice",
    title_fr: "Entraînement",
    title_en: "Practice",
};

/// Any signed-in account, whatever its role or tier.
pub fn gate_request() -> GateRequest {
    GateRequest::new()
}

pub fn learner_routes() -> Router<AppState> {
    Router::new()
        .route("/home", page(HOME))
        .route("/practice", page(PRACTICE))
}
