//! User lifecycle service: provisioning, profile updates and the
//! deactivation/reactivation workflow.

use std::sync::Arc;

use bcrypt::{hash, DEFAULT_COST};
use rand::Rng;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::assignment::ReassignmentCounts;
use crate::models::audit::{AuditAction, AuditRecord};
use crate::models::user::{NewUser, User, UserFilter, UserPatch};
use crate::store::{AuditSink, CacheInvalidation, UserStore};

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub full_name: String,
    pub display_name: String,
    pub email: String,
    /// Auto-generated when not provided
    pub password: Option<String>,
    pub is_super_admin: bool,
}

/// Input for updating a user's profile.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub full_name: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_super_admin: Option<bool>,
}

/// Generate a secure random password
pub(crate) fn generate_password() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghjkmnpqrstuvwxyz23456789!@#$%&*";
    let mut rng = rand::rng();
    (0..16)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

pub struct UserService {
    users: Arc<dyn UserStore>,
    audit: Arc<dyn AuditSink>,
    cache: Arc<dyn CacheInvalidation>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserStore>,
        audit: Arc<dyn AuditSink>,
        cache: Arc<dyn CacheInvalidation>,
    ) -> Self {
        Self {
            users,
            audit,
            cache,
        }
    }

    pub async fn count(&self) -> Result<i64> {
        self.users.count().await
    }

    /// First-boot provisioning: create a user with no acting user behind
    /// it. Used only before any session exists.
    pub async fn provision(&self, input: CreateUser) -> Result<(User, Option<String>)> {
        let (user, generated) = self.insert_user(input).await?;
        self.emit(
            AuditRecord::new(AuditAction::UserCreated)
                .target(user.id)
                .summary(serde_json::json!({ "email": user.email, "bootstrap": true })),
        )
        .await;
        Ok((user, generated))
    }

    pub async fn get(&self, id: i64) -> Result<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {id}")))
    }

    pub async fn list(&self, filter: &UserFilter) -> Result<(Vec<User>, i64)> {
        self.users.list(filter).await
    }

    /// Create a user. Returns the generated password when one was not
    /// provided, so it can be surfaced exactly once.
    pub async fn create(
        &self,
        input: CreateUser,
        acting_user_id: i64,
    ) -> Result<(User, Option<String>)> {
        let (user, generated) = self.insert_user(input).await?;

        self.emit(
            AuditRecord::new(AuditAction::UserCreated)
                .acting(acting_user_id)
                .target(user.id)
                .summary(serde_json::json!({ "email": user.email })),
        )
        .await;
        self.cache.invalidate_user(user.id).await;

        Ok((user, generated))
    }

    async fn insert_user(&self, input: CreateUser) -> Result<(User, Option<String>)> {
        let email = input.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::Validation(format!("invalid email: {email}")));
        }
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(format!("email already in use: {email}")));
        }

        let (password, generated) = match input.password {
            Some(password) => (password, None),
            None => {
                let password = generate_password();
                (password.clone(), Some(password))
            }
        };
        let password_hash = hash(&password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?;

        let user = self
            .users
            .insert(&NewUser {
                auth_identity: Uuid::new_v4().to_string(),
                full_name: input.full_name.trim().to_string(),
                display_name: input.display_name.trim().to_string(),
                email,
                password_hash: Some(password_hash),
                is_super_admin: input.is_super_admin,
            })
            .await?;

        Ok((user, generated))
    }

    /// Update profile fields. A user cannot remove their own super-admin
    /// flag; demotion must come from someone else.
    pub async fn update(&self, id: i64, input: UpdateUser, acting_user_id: i64) -> Result<User> {
        if acting_user_id == id && input.is_super_admin == Some(false) {
            return Err(AppError::Validation(
                "cannot remove your own super admin status".into(),
            ));
        }

        let email = match input.email {
            Some(email) => {
                let email = email.trim().to_lowercase();
                if let Some(existing) = self.users.find_by_email(&email).await? {
                    if existing.id != id {
                        return Err(AppError::Conflict(format!(
                            "email already in use: {email}"
                        )));
                    }
                }
                Some(email)
            }
            None => None,
        };

        let password_hash = match input.password {
            Some(password) => Some(
                hash(&password, DEFAULT_COST)
                    .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?,
            ),
            None => None,
        };

        let user = self
            .users
            .update(
                id,
                &UserPatch {
                    full_name: input.full_name,
                    display_name: input.display_name,
                    email,
                    password_hash,
                    is_super_admin: input.is_super_admin,
                },
            )
            .await?;

        self.emit(
            AuditRecord::new(AuditAction::UserUpdated)
                .acting(acting_user_id)
                .target(user.id),
        )
        .await;
        self.cache.invalidate_user(user.id).await;

        Ok(user)
    }

    /// Deactivate a user, unassigning every business record that still
    /// names them as responsible. Returns the per-kind counts for the
    /// caller's confirmation message. Deactivating an already-inactive
    /// user is a no-op with zero counts.
    pub async fn deactivate(&self, id: i64, acting_user_id: i64) -> Result<ReassignmentCounts> {
        if acting_user_id == id {
            return Err(AppError::Validation(
                "cannot deactivate your own account".into(),
            ));
        }

        // Existence check up front so the caller sees NotFound rather than
        // a cascade error.
        self.get(id).await?;

        let counts = self.users.deactivate_cascade(id).await?;

        self.emit(
            AuditRecord::new(AuditAction::UserDeactivated)
                .acting(acting_user_id)
                .target(id)
                .summary(serde_json::to_value(counts).unwrap_or_default()),
        )
        .await;
        self.cache.invalidate_user(id).await;

        tracing::info!(
            user_id = id,
            unassigned = counts.total(),
            "user deactivated"
        );
        Ok(counts)
    }

    /// Flip `active` back to true. Records unassigned by a previous
    /// deactivation stay unassigned.
    pub async fn reactivate(&self, id: i64, acting_user_id: i64) -> Result<User> {
        let user = self.users.reactivate(id).await?;

        self.emit(
            AuditRecord::new(AuditAction::UserReactivated)
                .acting(acting_user_id)
                .target(id),
        )
        .await;
        self.cache.invalidate_user(id).await;

        Ok(user)
    }

    async fn emit(&self, record: AuditRecord) {
        if let Err(e) = self.audit.record(record).await {
            tracing::warn!(error = %e, "failed to write audit record");
        }
    }
}
