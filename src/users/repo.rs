use axum::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;

pub const PROVIDER_GOOGLE: &str = "google";
pub const PROVIDER_PASSWORD: &str = "password";

/// User record in the database. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub auth_provider: String,
    pub google_id: Option<String>,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub about: Option<String>,
    pub favorite_color: Option<String>,
    pub nickname: Option<String>,
    pub favorite_food: Option<String>,
    pub past_experience: Option<String>,
    pub picture: Option<String>,
    pub participation_years: Vec<i32>,
    pub show_profile: bool,
    pub created_at: OffsetDateTime,
}

/// Fields required to create a record; everything else starts at its default.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub auth_provider: String,
    pub google_id: Option<String>,
    pub email: String,
    pub password_hash: Option<String>,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub picture: Option<String>,
}

/// Presence-aware partial update: `None` leaves the column unchanged,
/// `Some` overwrites it (including overwriting with an empty string).
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub auth_provider: Option<String>,
    pub google_id: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub about: Option<String>,
    pub favorite_color: Option<String>,
    pub nickname: Option<String>,
    pub favorite_food: Option<String>,
    pub past_experience: Option<String>,
    pub picture: Option<String>,
    pub participation_years: Option<Vec<i32>>,
    pub show_profile: Option<bool>,
}

/// Durable user store. Postgres in production; an in-memory fake in tests.
/// Unique email / google_id enforcement is the store's responsibility — a
/// losing concurrent insert must surface as `ApiError::Conflict`.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;
    async fn find_by_google_id(&self, google_id: &str) -> Result<Option<User>, ApiError>;
    async fn insert(&self, new: NewUser) -> Result<User, ApiError>;
    async fn update_fields(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, ApiError>;
    /// All visible profiles, ordered by (first_name, last_name, name)
    /// ascending, nulls first. A fresh query every call.
    async fn list_public(&self) -> Result<Vec<User>, ApiError>;
}

const USER_COLUMNS: &str = "id, auth_provider, google_id, email, password_hash, name, first_name, \
     last_name, about, favorite_color, nickname, favorite_food, past_experience, picture, \
     participation_years, show_profile, created_at";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_google_id(&self, google_id: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE google_id = $1"
        ))
        .bind(google_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn insert(&self, new: NewUser) -> Result<User, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (auth_provider, google_id, email, password_hash,
                               name, first_name, last_name, picture)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.auth_provider)
        .bind(&new.google_id)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.name)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.picture)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn update_fields(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                auth_provider       = COALESCE($2, auth_provider),
                google_id           = COALESCE($3, google_id),
                email               = COALESCE($4, email),
                name                = COALESCE($5, name),
                first_name          = COALESCE($6, first_name),
                last_name           = COALESCE($7, last_name),
                about               = COALESCE($8, about),
                favorite_color      = COALESCE($9, favorite_color),
                nickname            = COALESCE($10, nickname),
                favorite_food       = COALESCE($11, favorite_food),
                past_experience     = COALESCE($12, past_experience),
                picture             = COALESCE($13, picture),
                participation_years = COALESCE($14, participation_years),
                show_profile        = COALESCE($15, show_profile)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&patch.auth_provider)
        .bind(&patch.google_id)
        .bind(&patch.email)
        .bind(&patch.name)
        .bind(&patch.first_name)
        .bind(&patch.last_name)
        .bind(&patch.about)
        .bind(&patch.favorite_color)
        .bind(&patch.nickname)
        .bind(&patch.favorite_food)
        .bind(&patch.past_experience)
        .bind(&patch.picture)
        .bind(&patch.participation_years)
        .bind(patch.show_profile)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn list_public(&self) -> Result<Vec<User>, ApiError> {
        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE show_profile = TRUE
            ORDER BY first_name COLLATE "C" ASC NULLS FIRST,
                     last_name  COLLATE "C" ASC NULLS FIRST,
                     name       COLLATE "C" ASC NULLS FIRST
            "#
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }
}

#[cfg(test)]
pub mod memory {
    use super::*;
    use std::sync::Mutex;

    /// In-memory store mirroring the Postgres unique-index behavior.
    #[derive(Default)]
    pub struct MemoryUserStore {
        users: Mutex<Vec<User>>,
    }

    impl MemoryUserStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn len(&self) -> usize {
            self.users.lock().unwrap().len()
        }
    }

    fn apply(user: &mut User, patch: UserPatch) {
        if let Some(v) = patch.auth_provider {
            user.auth_provider = v;
        }
        if let Some(v) = patch.google_id {
            user.google_id = Some(v);
        }
        if let Some(v) = patch.email {
            user.email = v;
        }
        if let Some(v) = patch.name {
            user.name = Some(v);
        }
        if let Some(v) = patch.first_name {
            user.first_name = Some(v);
        }
        if let Some(v) = patch.last_name {
            user.last_name = Some(v);
        }
        if let Some(v) = patch.about {
            user.about = Some(v);
        }
        if let Some(v) = patch.favorite_color {
            user.favorite_color = Some(v);
        }
        if let Some(v) = patch.nickname {
            user.nickname = Some(v);
        }
        if let Some(v) = patch.favorite_food {
            user.favorite_food = Some(v);
        }
        if let Some(v) = patch.past_experience {
            user.past_experience = Some(v);
        }
        if let Some(v) = patch.picture {
            user.picture = Some(v);
        }
        if let Some(v) = patch.participation_years {
            user.participation_years = v;
        }
        if let Some(v) = patch.show_profile {
            user.show_profile = v;
        }
    }

    #[async_trait]
    impl UserStore for MemoryUserStore {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.id == id)
                .cloned())
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.email == email)
                .cloned())
        }

        async fn find_by_google_id(&self, google_id: &str) -> Result<Option<User>, ApiError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.google_id.as_deref() == Some(google_id))
                .cloned())
        }

        async fn insert(&self, new: NewUser) -> Result<User, ApiError> {
            let mut users = self.users.lock().unwrap();
            if users.iter().any(|u| u.email == new.email) {
                return Err(ApiError::Conflict("Record already exists".into()));
            }
            if let Some(gid) = &new.google_id {
                if users.iter().any(|u| u.google_id.as_deref() == Some(gid)) {
                    return Err(ApiError::Conflict("Record already exists".into()));
                }
            }
            let user = User {
                id: Uuid::new_v4(),
                auth_provider: new.auth_provider,
                google_id: new.google_id,
                email: new.email,
                password_hash: new.password_hash,
                name: new.name,
                first_name: new.first_name,
                last_name: new.last_name,
                about: None,
                favorite_color: None,
                nickname: None,
                favorite_food: None,
                past_experience: None,
                picture: new.picture,
                participation_years: Vec::new(),
                show_profile: false,
                created_at: OffsetDateTime::now_utc(),
            };
            users.push(user.clone());
            Ok(user)
        }

        async fn update_fields(
            &self,
            id: Uuid,
            patch: UserPatch,
        ) -> Result<Option<User>, ApiError> {
            let mut users = self.users.lock().unwrap();
            match users.iter_mut().find(|u| u.id == id) {
                Some(user) => {
                    apply(user, patch);
                    Ok(Some(user.clone()))
                }
                None => Ok(None),
            }
        }

        async fn list_public(&self) -> Result<Vec<User>, ApiError> {
            let mut users: Vec<User> = self
                .users
                .lock()
                .unwrap()
                .iter()
                .filter(|u| u.show_profile)
                .cloned()
                .collect();
            // Option sorts None before Some, matching NULLS FIRST.
            users.sort_by(|a, b| {
                (&a.first_name, &a.last_name, &a.name).cmp(&(&b.first_name, &b.last_name, &b.name))
            });
            Ok(users)
        }
    }
}
