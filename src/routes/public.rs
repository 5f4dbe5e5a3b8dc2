use crate::{
    AppState,
    handlers::{Page, page},
};
use axum::{Router, routing::get};

pub const CONNEXION: Page = Page {
    name: "connexion",
    title_fr: "Connexion",
    title_en: "Sign in",
};

pub const WELCOME: Page = Page {
    name: "welcome",
    title_fr: "Bienvenue",
    title_en: "Welcome",
};

pub const SUBSCRIPTION: Page = Page {
    name: "subscription",
    title_fr: "Abonnements",
    title_en: "Subscriptions",
};

pub const ADMIN_LOGIN: Page = Page {
    name: "admin-login",
    title_fr: "Connexion administrateur",
    title_en: "Administrator sign-in",
};

pub const MANAGER_LOGIN: Page = Page {
    name: "manager-login",
    title_fr: "Espace gestionnaire",
    title_en: "Manager sign-in",
};

/// Public Router Module
///
/// Everything a signed-out visitor may reach. The gate sends denied visitors to these
/// pages, so none of them may be gated themselves.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // Default login page, target of anonymous redirects outside /admin and /manager.
        .route("/connexion", page(CONNEXION))
        // Landing page for accounts without a recognised role.
        .route("/welcome", page(WELCOME))
        // Plans page, target of tier denials.
        .route("/subscription", page(SUBSCRIPTION))
        .route("/admin/login", page(ADMIN_LOGIN))
        .route("/manager", page(MANAGER_LOGIN))
}
