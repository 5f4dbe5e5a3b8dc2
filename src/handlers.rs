use axum::{
    Json,
    extract::State,
    routing::{MethodRouter, get},
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    AppState,
    auth::AuthUser,
    gate::{Decision, Gate, GateRequest, Session},
    models::{PageView, UserProfile},
};

// --- Pages ---

/// Page
///
/// Static description of a front-end page. Titles are bilingual, French first.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub name: &'static str,
    pub title_fr: &'static str,
    pub title_en: &'static str,
}

impl Page {
    pub fn view(&self, session: &Session) -> PageView {
        let user = session.user.as_ref();
        PageView {
            page: self.name.to_string(),
            title_fr: self.title_fr.to_string(),
            title_en: self.title_en.to_string(),
            role: user.and_then(|u| u.role),
            tier: user.and_then(|u| u.tier),
        }
    }
}

/// page
///
/// GET handler returning the page descriptor for whoever reached it. Gating happens in
/// the router layer, so by the time this runs the visitor is allowed in. Gated routes
/// read the session the gate stored; public routes resolve it through the extractor.
pub fn page(page: Page) -> MethodRouter<AppState> {
    get(move |session: Session| async move { Json(page.view(&session)) })
}

// --- API ---

/// EvaluateRequest
///
/// Body of `POST /access/evaluate`: a view's requirements plus the path the client is on.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct EvaluateRequest {
    #[serde(default)]
    pub request: GateRequest,
    pub current_path: String,
}

/// get_me
///
/// [Authenticated Route] The caller's profile plus the landing page for their role.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Profile", body = UserProfile),
        (status = 401, description = "No valid session")
    )
)]
pub async fn get_me(
    AuthUser { profile, .. }: AuthUser,
    State(gate): State<Gate>,
) -> Json<UserProfile> {
    let tier = profile.effective_tier(chrono::Utc::now());
    let home_path = gate.policy().home_for(profile.role).to_string();

    Json(UserProfile {
        id: profile.id,
        email: profile.email,
        role: profile.role,
        subscription_tier: tier,
        home_path,
    })
}

/// evaluate_access
///
/// [Public Route] Runs the access gate for a client-side view against the caller's
/// session. Front-end guards call this instead of re-implementing the rules, so the
/// server and every page agree on the outcome.
#[utoipa::path(
    post,
    path = "/access/evaluate",
    request_body = EvaluateRequest,
    responses((status = 200, description = "Gate decision", body = Decision))
)]
pub async fn evaluate_access(
    State(gate): State<Gate>,
    session: Session,
    Json(body): Json<EvaluateRequest>,
) -> Json<Decision> {
    Json(gate.evaluate(&session, &body.request, &body.current_path))
}
