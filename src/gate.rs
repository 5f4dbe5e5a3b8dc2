//! Access gate: the single decision point for every protected view.
//!
//! `Gate::evaluate` is a pure function of the session, the view's `GateRequest` and
//! the path being visited. Navigation side effects live in `guard` (client side) and
//! in the `access_gate` middleware (server side); both call this evaluator.

use std::{collections::BTreeSet, sync::Arc};

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::models::{Role, SessionUser, Tier};

/// Session
///
/// Snapshot published by the session provider. The gate only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub user: Option<SessionUser>,
    /// True while the provider is still resolving the user.
    pub loading: bool,
}

impl Session {
    pub fn loading() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user: SessionUser) -> Self {
        Self {
            user: Some(user),
            loading: false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Fallback
///
/// Content rendered in place of a protected view when the view opts out of redirects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Fallback {
    AccessDenied,
    UpgradeRequired,
    SignInRequired,
}

/// GateRequest
///
/// Static per-view access requirements. Empty role and tier sets mean no restriction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(default)]
#[ts(export)]
pub struct GateRequest {
    pub required_roles: BTreeSet<Role>,
    #[serde(alias = "required_subscription_tiers")]
    pub required_tiers: BTreeSet<Tier>,
    pub require_all: bool,
    /// Overrides the login page used for anonymous visitors.
    pub redirect_to: Option<String>,
    pub allow_unauthenticated: bool,
    /// When set, denials render this instead of navigating away.
    pub fallback: Option<Fallback>,
}

impl GateRequest {
    /// A request that only requires a signed-in user.
    pub fn new() -> Self {
        Self::default()
    }

    /// A request that lets everyone through, signed in or not.
    pub fn open() -> Self {
        Self::default().allow_unauthenticated(true)
    }

    pub fn roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.required_roles.extend(roles);
        self
    }

    pub fn tiers(mut self, tiers: impl IntoIterator<Item = Tier>) -> Self {
        self.required_tiers.extend(tiers);
        self
    }

    pub fn require_all(mut self, require_all: bool) -> Self {
        self.require_all = require_all;
        self
    }

    pub fn redirect_to(mut self, path: impl Into<String>) -> Self {
        self.redirect_to = Some(path.into());
        self
    }

    pub fn allow_unauthenticated(mut self, allow: bool) -> Self {
        self.allow_unauthenticated = allow;
        self
    }

    pub fn fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = Some(fallback);
        self
    }
}

/// Decision
///
/// Outcome of a gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum Decision {
    /// The session is still resolving; show a loading indicator, do not navigate.
    Pending,
    Allow,
    DenyRedirect { path: String },
    DenyRender { fallback: Fallback },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// RedirectPolicy
///
/// Where denied visitors are sent. Two landing tables exist for learners in the
/// deployed front ends (`USER` and `STUDENT` accounts), so each role has its own entry
/// rather than a hard-coded mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectPolicy {
    pub admin_home: String,
    pub senior_manager_home: String,
    pub junior_manager_home: String,
    pub user_home: String,
    pub student_home: String,
    /// Landing page for an authenticated account without a recognised role.
    pub no_role_home: String,
    pub subscription: String,
    pub default_login: String,
    /// Ordered `(path prefix, login page)` pairs; first match wins.
    pub login_prefixes: Vec<(String, String)>,
}

impl Default for RedirectPolicy {
    fn default() -> Self {
        Self {
            admin_home: "/admin".to_string(),
            senior_manager_home: "/manager/dashboard".to_string(),
            junior_manager_home: "/manager/dashboard".to_string(),
            user_home: "/home".to_string(),
            student_home: "/home".to_string(),
            no_role_home: "/welcome".to_string(),
            subscription: "/subscription".to_string(),
            default_login: "/connexion".to_string(),
            login_prefixes: vec![
                ("/admin".to_string(), "/admin/login".to_string()),
                ("/manager".to_string(), "/manager".to_string()),
            ],
        }
    }
}

impl RedirectPolicy {
    /// home_for
    ///
    /// Role-based default landing page, also used when a role check fails.
    pub fn home_for(&self, role: Option<Role>) -> &str {
        match role {
            Some(Role::Admin) => &self.admin_home,
            Some(Role::SeniorManager) => &self.senior_manager_home,
            Some(Role::JuniorManager) => &self.junior_manager_home,
            Some(Role::User) => &self.user_home,
            Some(Role::Student) => &self.student_home,
            None => &self.no_role_home,
        }
    }

    /// login_for
    ///
    /// Login page for an anonymous visitor, inferred from the area of the site they
    /// tried to reach.
    pub fn login_for(&self, current_path: &str) -> &str {
        self.login_prefixes
            .iter()
            .find(|(prefix, _)| path_has_prefix(current_path, prefix))
            .map(|(_, login)| login.as_str())
            .unwrap_or(&self.default_login)
    }
}

// Segment-aware: "/admin" matches "/admin" and "/admin/x" but not "/administrator".
fn path_has_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'),
        None => false,
    }
}

/// Gate
///
/// Stateless evaluator shared by every protected view. Cloning is cheap.
#[derive(Debug, Clone, Default)]
pub struct Gate {
    policy: Arc<RedirectPolicy>,
}

impl Gate {
    pub fn new(policy: RedirectPolicy) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }

    pub fn policy(&self) -> &RedirectPolicy {
        &self.policy
    }

    /// evaluate
    ///
    /// Decides whether the view guarded by `request` may render for `session` at
    /// `current_path`:
    /// 1. A loading session is `Pending`.
    /// 2. Anonymous visitors pass only if the view allows it, otherwise they go to the
    ///    configured `redirect_to` or the login page inferred from `current_path`.
    /// 3. A role mismatch sends the user to their role's landing page.
    /// 4. A tier mismatch sends the user to the subscription page.
    ///
    /// If the request carries a fallback, denials render it instead of redirecting.
    pub fn evaluate(&self, session: &Session, request: &GateRequest, current_path: &str) -> Decision {
        if session.loading {
            return Decision::Pending;
        }

        let Some(user) = session.user.as_ref() else {
            if request.allow_unauthenticated {
                return Decision::Allow;
            }
            let target = request
                .redirect_to
                .as_deref()
                .unwrap_or_else(|| self.policy.login_for(current_path));
            return self.deny(request, target, current_path, "unauthenticated");
        };

        if !roles_satisfied(user.role, request) {
            let target = self.policy.home_for(user.role);
            return self.deny(request, target, current_path, "role");
        }

        if !tiers_satisfied(user.tier, request) {
            return self.deny(request, &self.policy.subscription, current_path, "tier");
        }

        Decision::Allow
    }

    fn deny(&self, request: &GateRequest, target: &str, current_path: &str, reason: &str) -> Decision {
        let decision = match request.fallback {
            Some(fallback) => Decision::DenyRender { fallback },
            None => Decision::DenyRedirect {
                path: target.to_string(),
            },
        };
        tracing::debug!(reason, current_path, ?decision, "access denied");
        decision
    }
}

// A user holds exactly one role, so `require_all` only passes when every listed role is that role.
fn roles_satisfied(role: Option<Role>, request: &GateRequest) -> bool {
    if request.required_roles.is_empty() {
        return true;
    }
    let Some(role) = role else {
        return false;
    };
    if request.require_all {
        request.required_roles.iter().all(|required| *required == role)
    } else {
        request.required_roles.contains(&role)
    }
}

fn tiers_satisfied(tier: Option<Tier>, request: &GateRequest) -> bool {
    if request.required_tiers.is_empty() {
        return true;
    }
    let Some(tier) = tier else {
        return false;
    };
    if request.require_all {
        request.required_tiers.iter().all(|required| *required == tier)
    } else {
        request.required_tiers.contains(&tier)
    }
}
