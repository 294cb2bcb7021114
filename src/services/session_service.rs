//! Session service: credential verification and token issuance.

use std::sync::Arc;

use bcrypt::verify;

use crate::auth::identity::{IssuedToken, JwtIdentityProvider};
use crate::error::{AppError, Result};
use crate::models::audit::{AuditAction, AuditRecord};
use crate::models::user::User;
use crate::store::{AuditSink, UserStore};

pub struct SessionService {
    users: Arc<dyn UserStore>,
    tokens: Arc<JwtIdentityProvider>,
    audit: Arc<dyn AuditSink>,
}

impl SessionService {
    pub fn new(
        users: Arc<dyn UserStore>,
        tokens: Arc<JwtIdentityProvider>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            users,
            tokens,
            audit,
        }
    }

    /// Verify credentials and issue an access token.
    ///
    /// Every failure path answers the same `Unauthenticated` error so a
    /// caller cannot probe which accounts exist or are active.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, IssuedToken)> {
        let email = email.trim().to_lowercase();
        let user = self.users.find_by_email(&email).await?;

        let verified = match &user {
            Some(user) if user.active => match &user.password_hash {
                Some(hash) => verify(password, hash).unwrap_or(false),
                None => false,
            },
            _ => false,
        };

        if !verified {
            self.emit(
                AuditRecord::new(AuditAction::LoginFailed)
                    .summary(serde_json::json!({ "email": email })),
            )
            .await;
            return Err(AppError::Unauthenticated("invalid credentials".into()));
        }

        // Checked above
        let user = user.ok_or(AppError::UserNotFound)?;
        let issued = self.tokens.issue(&user.auth_identity)?;

        self.emit(AuditRecord::new(AuditAction::Login).acting(user.id).target(user.id))
            .await;

        Ok((user, issued))
    }

    async fn emit(&self, record: AuditRecord) {
        if let Err(e) = self.audit.record(record).await {
            tracing::warn!(error = %e, "failed to write audit record");
        }
    }
}
