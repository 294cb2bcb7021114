//! Permission grant and capability models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::error::AppError;

/// One stored permission decision: user x resource x operation.
/// Absence of a row is equivalent to `allowed = false`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct PermissionGrant {
    pub user_id: i64,
    pub resource: String,
    pub operation: String,
    pub allowed: bool,
}

/// Incoming grant entry for a full-replace save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GrantInput {
    pub resource: String,
    pub operation: String,
    #[serde(default = "default_allowed")]
    pub allowed: bool,
}

fn default_allowed() -> bool {
    true
}

impl GrantInput {
    pub fn allowed(resource: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            operation: operation.into(),
            allowed: true,
        }
    }

    pub fn denied(resource: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            operation: operation.into(),
            allowed: false,
        }
    }
}

/// Stored state of one capability for one user.
///
/// `Denied` (explicit false row) and `NoRecord` (no row at all) both collapse
/// to "not allowed" at the authorization boundary, but stay distinguishable
/// here so audit trails can tell "never granted" from "explicitly revoked".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantState {
    Granted,
    Denied,
    NoRecord,
}

impl GrantState {
    pub fn is_allowed(self) -> bool {
        matches!(self, GrantState::Granted)
    }
}

/// A concrete `resource:operation` pair being requested or checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Capability {
    pub resource: String,
    pub operation: String,
}

impl Capability {
    pub fn new(resource: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            operation: operation.into(),
        }
    }
}

impl FromStr for Capability {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((resource, operation)) if !resource.is_empty() && !operation.is_empty() => {
                Ok(Self::new(resource, operation))
            }
            _ => Err(AppError::Validation(format!(
                "malformed capability '{s}', expected 'resource:operation'"
            ))),
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.operation)
    }
}
