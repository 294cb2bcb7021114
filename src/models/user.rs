//! User model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// User entity. The numeric `id` is the foreign key every business table
/// uses for its "responsible user" column; `auth_identity` is the opaque
/// link to the session/identity layer.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub auth_identity: String,
    pub full_name: String,
    pub display_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub is_super_admin: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for inserting a new user row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub auth_identity: String,
    pub full_name: String,
    pub display_name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub is_super_admin: bool,
}

/// Partial update of profile fields. `active` is deliberately absent:
/// activation state only changes through the deactivation cascade and
/// reactivation paths.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub full_name: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub is_super_admin: Option<bool>,
}

/// Filters for listing users.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub search: Option<String>,
    pub active: Option<bool>,
    pub page: u32,
    pub per_page: u32,
}

impl UserFilter {
    pub fn page(&self) -> u32 {
        self.page.max(1)
    }

    pub fn per_page(&self) -> u32 {
        match self.per_page {
            0 => 50,
            n => n.min(200),
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page() - 1) * i64::from(self.per_page())
    }
}
