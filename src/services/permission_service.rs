//! Permission service: catalog overview, per-user grant views and the
//! full-replace save path.

use std::sync::Arc;

use crate::catalog::PermissionCatalog;
use crate::error::{AppError, Result};
use crate::models::audit::{AuditAction, AuditRecord};
use crate::models::matrix::PermissionMatrix;
use crate::models::permission::{GrantInput, PermissionGrant};
use crate::models::user::User;
use crate::store::{AuditSink, CacheInvalidation, GrantStore, UserStore};

/// A user's permission state, in both the sparse and the dense shape.
#[derive(Debug, Clone)]
pub struct UserGrants {
    pub user: User,
    pub grants: Vec<PermissionGrant>,
    pub matrix: PermissionMatrix,
}

pub struct PermissionService {
    users: Arc<dyn UserStore>,
    grants: Arc<dyn GrantStore>,
    catalog: Arc<PermissionCatalog>,
    audit: Arc<dyn AuditSink>,
    cache: Arc<dyn CacheInvalidation>,
}

impl PermissionService {
    pub fn new(
        users: Arc<dyn UserStore>,
        grants: Arc<dyn GrantStore>,
        catalog: Arc<PermissionCatalog>,
        audit: Arc<dyn AuditSink>,
        cache: Arc<dyn CacheInvalidation>,
    ) -> Self {
        Self {
            users,
            grants,
            catalog,
            audit,
            cache,
        }
    }

    pub fn catalog(&self) -> &PermissionCatalog {
        &self.catalog
    }

    /// Current grant state of a user, dense and sparse.
    pub async fn grants_for_user(&self, user_id: i64) -> Result<UserGrants> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))?;
        let grants = self.grants.list_for_user(user_id).await?;
        let matrix = PermissionMatrix::from_grants(&self.catalog, &grants);
        Ok(UserGrants {
            user,
            grants,
            matrix,
        })
    }

    /// Replace a user's whole grant set. The acting user is recorded in the
    /// audit trail; authorization was already checked at the gate.
    pub async fn replace_for_user(
        &self,
        user_id: i64,
        incoming: Vec<GrantInput>,
        acting_user_id: i64,
    ) -> Result<UserGrants> {
        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("user {user_id}")));
        }

        self.grants.replace_for_user(user_id, &incoming).await?;

        let granted = incoming.iter().filter(|g| g.allowed).count();
        let record = AuditRecord::new(AuditAction::PermissionsReplaced)
            .acting(acting_user_id)
            .target(user_id)
            .summary(serde_json::json!({
                "granted": granted,
                "total": self.catalog.total_entry_count(),
            }));
        if let Err(e) = self.audit.record(record).await {
            tracing::warn!(error = %e, "failed to write audit record");
        }
        self.cache.invalidate_user(user_id).await;

        self.grants_for_user(user_id).await
    }
}
