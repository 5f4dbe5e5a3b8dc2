use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Access Vocabulary ---

/// Role
///
/// Coarse permission level attached to every profile. The wire form is the
/// SCREAMING_SNAKE_CASE name used by the backend API (`"SENIOR_MANAGER"`).
///
/// `User` and `Student` are kept apart even though both describe a learner: older
/// accounts carry `USER`, newer ones `STUDENT`, and their landing pages are configured
/// separately in `RedirectPolicy`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum Role {
    Admin,
    SeniorManager,
    JuniorManager,
    User,
    Student,
}

impl Role {
    /// parse
    ///
    /// Lenient conversion from a stored or user-supplied role string.
    /// Unknown values yield `None` so that a malformed record can never grant access.
    pub fn parse(raw: &str) -> Option<Role> {
        match normalize(raw).as_str() {
            "ADMIN" => Some(Role::Admin),
            "SENIOR_MANAGER" => Some(Role::SeniorManager),
            "JUNIOR_MANAGER" => Some(Role::JuniorManager),
            "USER" => Some(Role::User),
            "STUDENT" => Some(Role::Student),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::SeniorManager => "SENIOR_MANAGER",
            Role::JuniorManager => "JUNIOR_MANAGER",
            Role::User => "USER",
            Role::Student => "STUDENT",
        }
    }

    pub fn is_manager(&self) -> bool {
        matches!(self, Role::SeniorManager | Role::JuniorManager)
    }
}

/// Tier
///
/// Subscription level gating premium exam content.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum Tier {
    Free,
    Essential,
    Premium,
    Pro,
}

impl Tier {
    pub fn parse(raw: &str) -> Option<Tier> {
        match normalize(raw).as_str() {
            "FREE" => Some(Tier::Free),
            "ESSENTIAL" => Some(Tier::Essential),
            "PREMIUM" => Some(Tier::Premium),
            "PRO" => Some(Tier::Pro),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "FREE",
            Tier::Essential => "ESSENTIAL",
            Tier::Premium => "PREMIUM",
            Tier::Pro => "PRO",
        }
    }
}

fn normalize(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}

// --- Stored Records ---

/// Profile
///
/// The user's record in the `profiles` table. Role and tier are already parsed;
/// the repository maps unrecognised column values to `None`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub role: Option<Role>,
    pub subscription_tier: Option<Tier>,
    // Absent means the subscription does not lapse (FREE, or granted manually).
    #[ts(type = "string | null")]
    pub subscription_expires_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// effective_tier
    ///
    /// The tier the user is entitled to at `now`. A lapsed subscription counts as no tier.
    pub fn effective_tier(&self, now: DateTime<Utc>) -> Option<Tier> {
        match self.subscription_expires_at {
            Some(expires_at) if expires_at <= now => None,
            _ => self.subscription_tier,
        }
    }

    /// session_user
    ///
    /// Projects the stored profile onto the fields the access gate reads.
    pub fn session_user(&self, now: DateTime<Utc>) -> SessionUser {
        SessionUser {
            id: self.id,
            role: self.role,
            tier: self.effective_tier(now),
        }
    }
}

/// SessionUser
///
/// The signed-in user as seen by the access gate.
/// `None` for role or tier is the most restrictive value, never a wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionUser {
    pub id: Uuid,
    pub role: Option<Role>,
    pub tier: Option<Tier>,
}

// --- Response Payloads ---

/// UserProfile
///
/// Response for `GET /me`. `home_path` is the landing page the front end should use
/// after sign-in, resolved from the same table the gate redirects with.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub role: Option<Role>,
    pub subscription_tier: Option<Tier>,
    pub home_path: String,
}

/// PageView
///
/// Descriptor returned by page routes once the gate lets a request through.
/// Markup is produced by the front end; the server only confirms which page was
/// granted and for whom.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PageView {
    pub page: String,
    pub title_fr: String,
    pub title_en: String,
    pub role: Option<Role>,
    pub tier: Option<Tier>,
}
