//! Persistence seams.
//!
//! Each external collaborator of the authorization core sits behind a
//! trait: the user directory, the permission grant store, the audit sink
//! and the cache-invalidation hook. Production wires the PostgreSQL
//! implementations; the test suite wires the in-memory ones.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::assignment::ReassignmentCounts;
use crate::models::audit::AuditRecord;
use crate::models::permission::{GrantInput, GrantState, PermissionGrant};
use crate::models::user::{NewUser, User, UserFilter, UserPatch};

pub use memory::{MemoryAuditSink, MemoryStore};
pub use postgres::{PgAuditSink, PgStore};

/// User directory plus the deactivation unit-of-work.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, data: &NewUser) -> Result<User>;

    /// Partial profile update. Fails with `NotFound` for unknown ids.
    async fn update(&self, id: i64, patch: &UserPatch) -> Result<User>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Resolve an opaque session principal to its user row, requiring
    /// `active = true`. Deactivated accounts never resolve, even while the
    /// identity layer still considers their session valid.
    async fn find_active_by_identity(&self, identity: &str) -> Result<Option<User>>;

    async fn list(&self, filter: &UserFilter) -> Result<(Vec<User>, i64)>;

    async fn count(&self) -> Result<i64>;

    /// The deactivation cascade as one unit of work: count references per
    /// assignable kind, clear every `responsavel_id` pointing at the user,
    /// and flip `active` to false — atomically. Concurrent calls for the
    /// same user serialize; the second caller observes `active = false`
    /// and returns zero counts without re-running the cascade.
    async fn deactivate_cascade(&self, user_id: i64) -> Result<ReassignmentCounts>;

    /// Flag flip only. No records are re-assigned back.
    async fn reactivate(&self, user_id: i64) -> Result<User>;
}

/// Per-user permission grant storage.
#[async_trait]
pub trait GrantStore: Send + Sync {
    /// All stored grants for a user. Empty for users with none.
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<PermissionGrant>>;

    /// Tri-state lookup of one capability.
    async fn state(&self, user_id: i64, resource: &str, operation: &str) -> Result<GrantState>;

    /// Full transactional replace of a user's grant set. Any prior grant
    /// absent from `grants` is revoked; a catalog-invalid pair rejects the
    /// whole batch and leaves the stored set untouched. `allowed = false`
    /// entries are not materialized (absence means denied).
    async fn replace_for_user(&self, user_id: i64, grants: &[GrantInput]) -> Result<()>;
}

/// Fire-and-forget audit record sink. Never part of a transaction.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, record: AuditRecord) -> Result<()>;
}

/// Hook invalidating any cached view of a user after a mutation. The
/// default no-op implementation degrades to bounded-TTL caching, which the
/// callers tolerate.
#[async_trait]
pub trait CacheInvalidation: Send + Sync {
    async fn invalidate_user(&self, user_id: i64);
}

/// Default cache hook: nothing is cached, nothing to invalidate.
#[derive(Debug, Default)]
pub struct NoopCache;

#[async_trait]
impl CacheInvalidation for NoopCache {
    async fn invalidate_user(&self, _user_id: i64) {}
}
