use crate::{
    AppState,
    gate::GateRequest,
    handlers::{Page, page},
    models::Tier,
};
use axum::Router;

pub const MOCK_EXAMS: Page = Page {
    name: "mock-exams",
    title_fr: "Examens blancs",
    title_en: "Mock exams",
};

/// Full mock exams are a PREMIUM/PRO feature. Lower tiers are sent to the plans page.
pub fn gate_request() -> GateRequest {
    GateRequest::new().tiers([Tier::Premium, Tier::Pro])
}

pub fn premium_routes() -> Router<AppState> {
    Router::new().route("/mock-exams", page(MOCK_EXAMS))
}
