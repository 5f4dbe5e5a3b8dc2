use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Profile, Role, Tier};

/// Repository Trait
///
/// Abstract contract for profile lookups. The session provider resolves every
/// authenticated request through `get_user`, so implementations must be cheap to share
/// across Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn get_user(&self, id: Uuid) -> Option<Profile>;
    // Inserts or replaces the profile. Returns None when the store rejected it.
    async fn create_user(&self, profile: Profile) -> Option<Profile>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// ProfileRow
///
/// Raw `profiles` row. Role and tier are free-form text in the database and are only
/// interpreted when converted into a `Profile`.
#[derive(Debug, FromRow)]
struct ProfileRow {
    id: Uuid,
    email: String,
    role: Option<String>,
    subscription_tier: Option<String>,
    subscription_expires_at: Option<DateTime<Utc>>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        let role = row.role.as_deref().and_then(Role::parse);
        if role.is_none() {
            if let Some(raw) = row.role.as_deref() {
                tracing::warn!(user_id = %row.id, raw, "unrecognised role, treating as none");
            }
        }
        Profile {
            id: row.id,
            email: row.email,
            role,
            subscription_tier: row.subscription_tier.as_deref().and_then(Tier::parse),
            subscription_expires_at: row.subscription_expires_at,
        }
    }
}

/// PostgresRepository
///
/// `Repository` backed by the `profiles` table.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// get_user
    ///
    /// Retrieves the profile data (role, tier, expiry) needed for authorization.
    /// Database failures are logged and reported as "not found", which the gate treats
    /// as an anonymous session.
    async fn get_user(&self, id: Uuid) -> Option<Profile> {
        let result = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, email, role, subscription_tier, subscription_expires_at \
             FROM profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(row) => row.map(Profile::from),
            Err(e) => {
                tracing::error!(user_id = %id, error = %e, "profile lookup failed");
                None
            }
        }
    }

    async fn create_user(&self, profile: Profile) -> Option<Profile> {
        let result = sqlx::query_as::<_, ProfileRow>(
            "INSERT INTO profiles (id, email, role, subscription_tier, subscription_expires_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (id) DO UPDATE SET email = EXCLUDED.email, role = EXCLUDED.role, \
             subscription_tier = EXCLUDED.subscription_tier, \
             subscription_expires_at = EXCLUDED.subscription_expires_at \
             RETURNING id, email, role, subscription_tier, subscription_expires_at",
        )
        .bind(profile.id)
        .bind(&profile.email)
        .bind(profile.role.map(|r| r.as_str()))
        .bind(profile.subscription_tier.map(|t| t.as_str()))
        .bind(profile.subscription_expires_at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Some(row.into()),
            Err(e) => {
                tracing::error!(user_id = %profile.id, error = %e, "profile insert failed");
                None
            }
        }
    }
}

/// InMemoryRepository
///
/// Process-local profile store used when no database is configured (local development)
/// and by tests.
#[derive(Default)]
pub struct InMemoryRepository {
    profiles: RwLock<HashMap<Uuid, Profile>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(profiles: impl IntoIterator<Item = Profile>) -> Self {
        Self {
            profiles: RwLock::new(profiles.into_iter().map(|p| (p.id, p)).collect()),
        }
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_user(&self, id: Uuid) -> Option<Profile> {
        self.profiles.read().await.get(&id).cloned()
    }

    async fn create_user(&self, profile: Profile) -> Option<Profile> {
        self.profiles
            .write()
            .await
            .insert(profile.id, profile.clone());
        Some(profile)
    }
}
