use axum::{
    Extension, Json, Router,
    extract::{FromRef, Request, State},
    http::{HeaderName, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod gate;
pub mod guard;
pub mod handlers;
pub mod models;
pub mod repository;

// Page and API routers, grouped by the access they require.
pub mod routes;
use routes::{admin, api, learner, manager, premium, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use gate::{Decision, Fallback, Gate, GateRequest, RedirectPolicy, Session};
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document for the JSON endpoints, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::get_me, handlers::evaluate_access),
    components(schemas(
        models::Role, models::Tier, models::UserProfile, models::PageView,
        gate::GateRequest, gate::Decision, gate::Fallback, handlers::EvaluateRequest,
    )),
    tags((name = "tcf-prep", description = "TCF/TEF exam preparation portal"))
)]
struct ApiDoc;

/// AppState
///
/// Shared, immutable container for everything handlers and extractors need.
#[derive(Clone)]
pub struct AppState {
    /// Profile lookups for the session provider.
    pub repo: RepositoryState,
    pub config: AppConfig,
    /// The one evaluator every gated route goes through.
    pub gate: Gate,
}

impl AppState {
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        let gate = Gate::new(config.redirects.clone());
        Self { repo, config, gate }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for Gate {
    fn from_ref(app_state: &AppState) -> Gate {
        app_state.gate.clone()
    }
}

#[derive(Serialize)]
struct FallbackBody {
    fallback: Fallback,
}

/// access_gate
///
/// Middleware applied to every protected router. Reads the router's `GateRequest`
/// (installed as an `Extension` just outside this layer), evaluates it against the
/// request's session and turns the `Decision` into a response:
///
/// - `Allow`: the handler runs, with the evaluated `Session` as a request extension.
/// - `DenyRedirect`: `303 See Other` to the target, or `403` when the request is already
///   on the target so the browser cannot loop.
/// - `DenyRender`: the fallback as JSON with a status matching the reason.
/// - `Pending`: `503` with `Retry-After`.
async fn access_gate(
    State(gate): State<Gate>,
    Extension(gate_request): Extension<GateRequest>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    let current_path = request.uri().path().to_string();

    match gate.evaluate(&session, &gate_request, &current_path) {
        Decision::Allow => {
            // Handlers see exactly the session the gate decided on.
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Decision::DenyRedirect { path } if path == current_path => {
            tracing::warn!(%path, "redirect target equals request path, refusing to loop");
            StatusCode::FORBIDDEN.into_response()
        }
        Decision::DenyRedirect { path } => Redirect::to(&path).into_response(),
        Decision::DenyRender { fallback } => {
            let status = match fallback {
                Fallback::AccessDenied => StatusCode::FORBIDDEN,
                Fallback::UpgradeRequired => StatusCode::PAYMENT_REQUIRED,
                Fallback::SignInRequired => StatusCode::UNAUTHORIZED,
            };
            (status, Json(FallbackBody { fallback })).into_response()
        }
        Decision::Pending => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::RETRY_AFTER, "1")],
        )
            .into_response(),
    }
}

/// protect
///
/// Wraps `router` in the access gate with the given requirements.
fn protect(router: Router<AppState>, gate_request: GateRequest, state: &AppState) -> Router<AppState> {
    router
        .route_layer(middleware::from_fn_with_state(state.clone(), access_gate))
        .route_layer(Extension(gate_request))
}

/// create_router
///
/// Assembles the routing structure, applies the access gate per route group and the
/// global observability layers, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(api::api_routes())
        .merge(protect(learner::learner_routes(), learner::gate_request(), &state))
        .merge(protect(premium::premium_routes(), premium::gate_request(), &state))
        .merge(protect(manager::manager_routes(), manager::gate_request(), &state))
        .merge(protect(admin::admin_routes(), admin::gate_request(), &state))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for `TraceLayer` carrying the method, URI and `x-request-id`, so every log line
/// of a request (gate decisions included) can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
