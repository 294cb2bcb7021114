//! Authorization gate: the single choke point for privileged operations.
//!
//! Every sensitive request resolves its session to an active user and
//! checks the required capabilities against stored grants, with the
//! super-admin flag short-circuiting all lookups.

use std::sync::Arc;

use crate::catalog::PermissionCatalog;
use crate::error::{AppError, Result};
use crate::models::permission::Capability;
use crate::models::user::User;
use crate::store::{GrantStore, UserStore};

use super::identity::IdentityProvider;

pub struct AuthorizationGate {
    identity: Arc<dyn IdentityProvider>,
    users: Arc<dyn UserStore>,
    grants: Arc<dyn GrantStore>,
    catalog: Arc<PermissionCatalog>,
}

impl AuthorizationGate {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        users: Arc<dyn UserStore>,
        grants: Arc<dyn GrantStore>,
        catalog: Arc<PermissionCatalog>,
    ) -> Self {
        Self {
            identity,
            users,
            grants,
            catalog,
        }
    }

    /// Resolve a session token to its active user row.
    ///
    /// `Unauthenticated` when the credential is missing/invalid;
    /// `UserNotFound` when the principal resolves but no *active* user
    /// matches — which also covers a deactivated account whose session the
    /// identity layer still considers valid.
    pub async fn resolve_user(&self, token: &str) -> Result<User> {
        let principal = self.identity.resolve(token).await?;
        self.users
            .find_active_by_identity(&principal.subject)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    /// Check a resolved user against the required capabilities.
    ///
    /// Super admins pass without any grant lookups. Otherwise each
    /// capability is checked in order and the first miss fails with
    /// `PermissionDenied` naming it. A capability outside the catalog is a
    /// caller bug and is rejected as `Validation`, never silently denied.
    pub async fn require(&self, user: &User, required: &[Capability]) -> Result<()> {
        if user.is_super_admin {
            return Ok(());
        }

        for capability in required {
            if !self
                .catalog
                .is_valid_operation(&capability.resource, &capability.operation)
            {
                return Err(AppError::Validation(format!(
                    "capability not in catalog: {capability}"
                )));
            }

            let state = self
                .grants
                .state(user.id, &capability.resource, &capability.operation)
                .await?;
            if !state.is_allowed() {
                tracing::warn!(
                    user_id = user.id,
                    resource = %capability.resource,
                    operation = %capability.operation,
                    "authorization denied"
                );
                return Err(AppError::PermissionDenied {
                    resource: capability.resource.clone(),
                    operation: capability.operation.clone(),
                });
            }
        }

        Ok(())
    }

    /// Full authorization pass: session token in, authorized user id out.
    /// Pure with respect to (session, stored grants): repeated calls with
    /// no intervening permission change yield the same result.
    pub async fn authorize(&self, token: &str, required: &[Capability]) -> Result<i64> {
        let user = self.resolve_user(token).await?;
        self.require(&user, required).await?;
        Ok(user.id)
    }
}
