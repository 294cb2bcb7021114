//! In-memory store implementations.
//!
//! Backs the test suite and offline tooling with the same trait contracts
//! the PostgreSQL store honors, including replace/cascade atomicity (one
//! mutex guard spans each unit of work).

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::catalog::PermissionCatalog;
use crate::error::{AppError, Result};
use crate::models::assignment::{AssignableKind, ReassignmentCounts};
use crate::models::audit::AuditRecord;
use crate::models::permission::{GrantInput, GrantState, PermissionGrant};
use crate::models::user::{NewUser, User, UserFilter, UserPatch};
use crate::store::{AuditSink, GrantStore, UserStore};

#[derive(Debug, Clone)]
struct Assignment {
    kind: AssignableKind,
    responsible: Option<i64>,
}

#[derive(Default)]
struct Inner {
    next_user_id: i64,
    users: BTreeMap<i64, User>,
    grants: BTreeMap<i64, Vec<PermissionGrant>>,
    assignments: Vec<Assignment>,
}

/// In-memory user and grant store.
pub struct MemoryStore {
    catalog: Arc<PermissionCatalog>,
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new(catalog: Arc<PermissionCatalog>) -> Self {
        Self {
            catalog,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seed `count` business records of `kind` assigned to `user_id`.
    pub fn seed_assignments(&self, kind: AssignableKind, user_id: i64, count: usize) {
        let mut inner = self.lock();
        for _ in 0..count {
            inner.assignments.push(Assignment {
                kind,
                responsible: Some(user_id),
            });
        }
    }

    /// How many business records of any kind still reference `user_id`.
    pub fn assignments_referencing(&self, user_id: i64) -> usize {
        self.lock()
            .assignments
            .iter()
            .filter(|a| a.responsible == Some(user_id))
            .count()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, data: &NewUser) -> Result<User> {
        let mut inner = self.lock();
        if inner.users.values().any(|u| u.email == data.email) {
            // Mirrors the unique constraint on users.email
            return Err(AppError::Conflict(format!(
                "email already in use: {}",
                data.email
            )));
        }
        inner.next_user_id += 1;
        let id = inner.next_user_id;
        let now = Utc::now();
        let user = User {
            id,
            auth_identity: data.auth_identity.clone(),
            full_name: data.full_name.clone(),
            display_name: data.display_name.clone(),
            email: data.email.clone(),
            password_hash: data.password_hash.clone(),
            is_super_admin: data.is_super_admin,
            active: true,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: i64, patch: &UserPatch) -> Result<User> {
        let mut inner = self.lock();
        let user = inner
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;
        if let Some(full_name) = &patch.full_name {
            user.full_name = full_name.clone();
        }
        if let Some(display_name) = &patch.display_name {
            user.display_name = display_name.clone();
        }
        if let Some(email) = &patch.email {
            user.email = email.clone();
        }
        if let Some(password_hash) = &patch.password_hash {
            user.password_hash = Some(password_hash.clone());
        }
        if let Some(is_super_admin) = patch.is_super_admin {
            user.is_super_admin = is_super_admin;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_active_by_identity(&self, identity: &str) -> Result<Option<User>> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.auth_identity == identity && u.active)
            .cloned())
    }

    async fn list(&self, filter: &UserFilter) -> Result<(Vec<User>, i64)> {
        let inner = self.lock();
        let needle = filter
            .search
            .as_ref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let mut matching: Vec<User> = inner
            .users
            .values()
            .filter(|u| {
                if let Some(active) = filter.active {
                    if u.active != active {
                        return false;
                    }
                }
                match &needle {
                    Some(needle) => {
                        u.full_name.to_lowercase().contains(needle)
                            || u.display_name.to_lowercase().contains(needle)
                            || u.email.to_lowercase().contains(needle)
                    }
                    None => true,
                }
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as i64;
        let offset = filter.offset() as usize;
        let page: Vec<User> = matching
            .into_iter()
            .skip(offset)
            .take(filter.per_page() as usize)
            .collect();
        Ok((page, total))
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.lock().users.len() as i64)
    }

    async fn deactivate_cascade(&self, user_id: i64) -> Result<ReassignmentCounts> {
        // One guard spans counts, reassignment and the flag flip, so no
        // other caller observes a partially-applied cascade.
        let mut inner = self.lock();
        let user = inner
            .users
            .get(&user_id)
            .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))?;
        if !user.active {
            return Ok(ReassignmentCounts::default());
        }

        let mut counts = ReassignmentCounts::default();
        for kind in AssignableKind::ALL {
            let referencing = inner
                .assignments
                .iter()
                .filter(|a| a.kind == kind && a.responsible == Some(user_id))
                .count() as i64;
            counts.set(kind, referencing);
        }
        for assignment in inner.assignments.iter_mut() {
            if assignment.responsible == Some(user_id) {
                assignment.responsible = None;
            }
        }
        if let Some(user) = inner.users.get_mut(&user_id) {
            user.active = false;
            user.updated_at = Utc::now();
        }
        Ok(counts)
    }

    async fn reactivate(&self, user_id: i64) -> Result<User> {
        let mut inner = self.lock();
        let user = inner
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))?;
        user.active = true;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl GrantStore for MemoryStore {
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<PermissionGrant>> {
        Ok(self.lock().grants.get(&user_id).cloned().unwrap_or_default())
    }

    async fn state(&self, user_id: i64, resource: &str, operation: &str) -> Result<GrantState> {
        let inner = self.lock();
        let found = inner.grants.get(&user_id).and_then(|grants| {
            grants
                .iter()
                .find(|g| g.resource == resource && g.operation == operation)
        });
        Ok(match found {
            Some(grant) if grant.allowed => GrantState::Granted,
            Some(_) => GrantState::Denied,
            None => GrantState::NoRecord,
        })
    }

    async fn replace_for_user(&self, user_id: i64, grants: &[GrantInput]) -> Result<()> {
        self.catalog.validate_grants(grants)?;

        let mut stored: Vec<PermissionGrant> = Vec::new();
        for grant in grants.iter().filter(|g| g.allowed) {
            let duplicate = stored
                .iter()
                .any(|g| g.resource == grant.resource && g.operation == grant.operation);
            if !duplicate {
                stored.push(PermissionGrant {
                    user_id,
                    resource: grant.resource.clone(),
                    operation: grant.operation.clone(),
                    allowed: true,
                });
            }
        }

        self.lock().grants.insert(user_id, stored);
        Ok(())
    }
}

/// Audit sink collecting records in memory, inspectable from tests.
#[derive(Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, record: AuditRecord) -> Result<()> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record);
        Ok(())
    }
}
