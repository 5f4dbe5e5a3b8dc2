use std::env;

use crate::gate::RedirectPolicy;

/// AppConfig
///
/// Holds the application's entire configuration state. Immutable once loaded and pulled
/// into handlers and extractors via FromRef.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls the local `x-user-id` bypass and log format.
    pub env: Env,
    // Postgres connection string. Absent locally means profiles are kept in memory.
    pub db_url: Option<String>,
    // Secret used to verify session JWTs (HS256).
    pub jwt_secret: String,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Name of the cookie carrying the session JWT for page navigations.
    pub session_cookie: String,
    // Landing/login table used by the access gate.
    pub redirects: RedirectPolicy,
}

/// Env
///
/// Runtime context: development conveniences in Local, hardened behaviour in Production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const LOCAL_JWT_SECRET: &str = "super-secure-test-secret-value-local";

impl Default for AppConfig {
    /// default
    ///
    /// Safe, non-panicking configuration for tests and scaffolding.
    fn default() -> Self {
        Self {
            env: Env::Local,
            db_url: None,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            bind_addr: "0.0.0.0:3000".to_string(),
            session_cookie: "tcf_session".to_string(),
            redirects: RedirectPolicy::default(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables at startup.
    ///
    /// # Panics
    /// Panics if `DATABASE_URL` or `JWT_SECRET` is missing in production, so the service
    /// never starts with an incomplete or insecure configuration.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match env {
            Env::Production => {
                env::var("JWT_SECRET").expect("FATAL: JWT_SECRET must be set in production.")
            }
            Env::Local => env::var("JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
        };

        let db_url = match env {
            Env::Production => Some(
                env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in production"),
            ),
            Env::Local => env::var("DATABASE_URL").ok(),
        };

        let defaults = Self::default();
        Self {
            env,
            db_url,
            jwt_secret,
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            session_cookie: env::var("SESSION_COOKIE").unwrap_or(defaults.session_cookie),
            redirects: load_redirects(defaults.redirects),
        }
    }
}

/// load_redirects
///
/// Applies `HOME_PATH_*`, `SUBSCRIPTION_PATH` and `LOGIN_PATH` overrides on top of the
/// built-in table. `HOME_PATH_USER` and `HOME_PATH_STUDENT` are independent on purpose:
/// deployments disagree on where each learner role lands.
fn load_redirects(mut policy: RedirectPolicy) -> RedirectPolicy {
    let overrides = [
        ("HOME_PATH_ADMIN", &mut policy.admin_home),
        ("HOME_PATH_SENIOR_MANAGER", &mut policy.senior_manager_home),
        ("HOME_PATH_JUNIOR_MANAGER", &mut policy.junior_manager_home),
        ("HOME_PATH_USER", &mut policy.user_home),
        ("HOME_PATH_STUDENT", &mut policy.student_home),
        ("HOME_PATH_NO_ROLE", &mut policy.no_role_home),
        ("SUBSCRIPTION_PATH", &mut policy.subscription),
        ("LOGIN_PATH", &mut policy.default_login),
    ];
    for (var, slot) in overrides {
        if let Ok(path) = env::var(var) {
            if path.starts_with('/') {
                *slot = path;
            } else {
                tracing::warn!(var, %path, "ignoring redirect override, paths must start with '/'");
            }
        }
    }
    policy
}
