//! Audit trail models.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Audit action types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Login,
    LoginFailed,
    UserCreated,
    UserUpdated,
    UserDeactivated,
    UserReactivated,
    PermissionsReplaced,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "LOGIN",
            AuditAction::LoginFailed => "LOGIN_FAILED",
            AuditAction::UserCreated => "USER_CREATED",
            AuditAction::UserUpdated => "USER_UPDATED",
            AuditAction::UserDeactivated => "USER_DEACTIVATED",
            AuditAction::UserReactivated => "USER_REACTIVATED",
            AuditAction::PermissionsReplaced => "PERMISSIONS_REPLACED",
        }
    }
}

/// One audit record as emitted by the services.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub acting_user_id: Option<i64>,
    pub target_user_id: Option<i64>,
    pub action: AuditAction,
    pub summary: Option<serde_json::Value>,
    pub correlation_id: Uuid,
}

impl AuditRecord {
    pub fn new(action: AuditAction) -> Self {
        Self {
            acting_user_id: None,
            target_user_id: None,
            action,
            summary: None,
            correlation_id: Uuid::new_v4(),
        }
    }

    pub fn acting(mut self, user_id: i64) -> Self {
        self.acting_user_id = Some(user_id);
        self
    }

    pub fn target(mut self, user_id: i64) -> Self {
        self.target_user_id = Some(user_id);
        self
    }

    pub fn summary(mut self, summary: serde_json::Value) -> Self {
        self.summary = Some(summary);
        self
    }
}

/// Stored audit row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLogEntry {
    pub id: i64,
    pub acting_user_id: Option<i64>,
    pub target_user_id: Option<i64>,
    pub action: String,
    pub summary: Option<serde_json::Value>,
    pub correlation_id: Uuid,
    pub created_at: DateTime<Utc>,
}
