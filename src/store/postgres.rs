//! PostgreSQL store implementations.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::catalog::PermissionCatalog;
use crate::error::{AppError, Result};
use crate::models::assignment::{AssignableKind, ReassignmentCounts};
use crate::models::audit::AuditRecord;
use crate::models::permission::{GrantInput, GrantState, PermissionGrant};
use crate::models::user::{NewUser, User, UserFilter, UserPatch};
use crate::store::{AuditSink, GrantStore, UserStore};

const USER_COLUMNS: &str = "id, auth_identity, full_name, display_name, email, password_hash, \
     is_super_admin, active, created_at, updated_at";

/// User and grant storage backed by PostgreSQL.
pub struct PgStore {
    pool: PgPool,
    catalog: Arc<PermissionCatalog>,
}

impl PgStore {
    pub fn new(pool: PgPool, catalog: Arc<PermissionCatalog>) -> Self {
        Self { pool, catalog }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert(&self, data: &NewUser) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (auth_identity, full_name, display_name, email, password_hash, is_super_admin)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&data.auth_identity)
        .bind(&data.full_name)
        .bind(&data.display_name)
        .bind(&data.email)
        .bind(&data.password_hash)
        .bind(data.is_super_admin)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update(&self, id: i64, patch: &UserPatch) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                full_name = COALESCE($2, full_name),
                display_name = COALESCE($3, display_name),
                email = COALESCE($4, email),
                password_hash = COALESCE($5, password_hash),
                is_super_admin = COALESCE($6, is_super_admin),
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&patch.full_name)
        .bind(&patch.display_name)
        .bind(&patch.email)
        .bind(&patch.password_hash)
        .bind(patch.is_super_admin)
        .fetch_optional(&self.pool)
        .await?;

        user.ok_or_else(|| AppError::NotFound(format!("user {id}")))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_active_by_identity(&self, identity: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE auth_identity = $1 AND active = true"
        ))
        .bind(identity)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list(&self, filter: &UserFilter) -> Result<(Vec<User>, i64)> {
        let search = filter.search.as_ref().map(|s| s.trim().to_string());

        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE ($1::text IS NULL
                   OR full_name ILIKE '%' || $1 || '%'
                   OR display_name ILIKE '%' || $1 || '%'
                   OR email ILIKE '%' || $1 || '%')
              AND ($2::boolean IS NULL OR active = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(&search)
        .bind(filter.active)
        .bind(i64::from(filter.per_page()))
        .bind(filter.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM users
            WHERE ($1::text IS NULL
                   OR full_name ILIKE '%' || $1 || '%'
                   OR display_name ILIKE '%' || $1 || '%'
                   OR email ILIKE '%' || $1 || '%')
              AND ($2::boolean IS NULL OR active = $2)
            "#,
        )
        .bind(&search)
        .bind(filter.active)
        .fetch_one(&self.pool)
        .await?;

        Ok((users, total))
    }

    async fn count(&self) -> Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn deactivate_cascade(&self, user_id: i64) -> Result<ReassignmentCounts> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent deactivations of the same user.
        let active: Option<bool> =
            sqlx::query_scalar("SELECT active FROM users WHERE id = $1 FOR UPDATE")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;

        let active = active.ok_or_else(|| AppError::NotFound(format!("user {user_id}")))?;
        if !active {
            // Second caller: the cascade already ran, nothing left to clear.
            tx.rollback().await?;
            return Ok(ReassignmentCounts::default());
        }

        let mut counts = ReassignmentCounts::default();
        for kind in AssignableKind::ALL {
            let referencing: i64 = sqlx::query_scalar(&format!(
                "SELECT COUNT(*) FROM {} WHERE responsavel_id = $1",
                kind.table()
            ))
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

            counts.set(kind, referencing);
            if referencing > 0 {
                sqlx::query(&format!(
                    "UPDATE {} SET responsavel_id = NULL WHERE responsavel_id = $1",
                    kind.table()
                ))
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        sqlx::query("UPDATE users SET active = false, updated_at = now() WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        // One commit covers every reassignment plus the flag flip: no reader
        // observes an inactive user with stale responsavel_id references.
        tx.commit().await?;

        Ok(counts)
    }

    async fn reactivate(&self, user_id: i64) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET active = true, updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        user.ok_or_else(|| AppError::NotFound(format!("user {user_id}")))
    }
}

#[async_trait]
impl GrantStore for PgStore {
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<PermissionGrant>> {
        let grants = sqlx::query_as::<_, PermissionGrant>(
            r#"
            SELECT user_id, resource, operation, allowed
            FROM user_permissions
            WHERE user_id = $1
            ORDER BY resource, operation
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(grants)
    }

    async fn state(&self, user_id: i64, resource: &str, operation: &str) -> Result<GrantState> {
        let allowed: Option<bool> = sqlx::query_scalar(
            r#"
            SELECT allowed FROM user_permissions
            WHERE user_id = $1 AND resource = $2 AND operation = $3
            "#,
        )
        .bind(user_id)
        .bind(resource)
        .bind(operation)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match allowed {
            Some(true) => GrantState::Granted,
            Some(false) => GrantState::Denied,
            None => GrantState::NoRecord,
        })
    }

    async fn replace_for_user(&self, user_id: i64, grants: &[GrantInput]) -> Result<()> {
        // Validate before touching the database: a bad pair rejects the
        // whole batch with the stored set untouched.
        self.catalog.validate_grants(grants)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_permissions WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for grant in grants.iter().filter(|g| g.allowed) {
            sqlx::query(
                r#"
                INSERT INTO user_permissions (user_id, resource, operation, allowed)
                VALUES ($1, $2, $3, true)
                ON CONFLICT (user_id, resource, operation) DO UPDATE SET allowed = true
                "#,
            )
            .bind(user_id)
            .bind(&grant.resource)
            .bind(&grant.operation)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

/// Audit sink writing to the `audit_log` table.
pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn record(&self, record: AuditRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_log (acting_user_id, target_user_id, action, summary, correlation_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.acting_user_id)
        .bind(record.target_user_id)
        .bind(record.action.as_str())
        .bind(&record.summary)
        .bind(record.correlation_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
