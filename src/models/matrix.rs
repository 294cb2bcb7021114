//! Dense permission matrix: the editing shape of a user's grant set.
//!
//! Storage keeps grants sparse (only `allowed = true` rows exist); the UI
//! edits a dense matrix where every catalog entry is present and defaults to
//! denied. This module is the bidirectional transform between the two.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::PermissionCatalog;
use crate::models::permission::{GrantInput, PermissionGrant};

/// Dense resource -> operation -> allowed map. Every catalog entry is
/// present; cells without a matching `allowed = true` grant are `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionMatrix(BTreeMap<String, BTreeMap<String, bool>>);

impl PermissionMatrix {
    /// Build the dense matrix for a grant list. Grants with
    /// `allowed = false` and grants outside the catalog contribute nothing.
    /// Super-admin status is a render-time concern for callers and is never
    /// materialized into the matrix itself.
    pub fn from_grants(catalog: &PermissionCatalog, grants: &[PermissionGrant]) -> Self {
        let mut matrix: BTreeMap<String, BTreeMap<String, bool>> = catalog
            .resources()
            .iter()
            .map(|r| {
                (
                    r.name.clone(),
                    r.operations.iter().map(|op| (op.clone(), false)).collect(),
                )
            })
            .collect();

        for grant in grants {
            if !grant.allowed {
                continue;
            }
            if let Some(cell) = matrix
                .get_mut(&grant.resource)
                .and_then(|ops| ops.get_mut(&grant.operation))
            {
                *cell = true;
            }
        }

        Self(matrix)
    }

    /// Flatten back to the sparse storage shape: exactly one
    /// `allowed = true` entry per true cell, nothing for false cells.
    pub fn to_grants(&self) -> Vec<GrantInput> {
        self.0
            .iter()
            .flat_map(|(resource, ops)| {
                ops.iter().filter(|(_, &allowed)| allowed).map(move |(op, _)| {
                    GrantInput::allowed(resource.clone(), op.clone())
                })
            })
            .collect()
    }

    /// Number of granted cells, for "N of M permissions active" reporting.
    pub fn count_active(&self) -> usize {
        self.0
            .values()
            .map(|ops| ops.values().filter(|&&allowed| allowed).count())
            .sum()
    }

    /// True iff any cell differs. Used to gate "unsaved changes" UI and to
    /// skip save round-trips that would be no-ops.
    pub fn differs_from(&self, other: &PermissionMatrix) -> bool {
        self.0 != other.0
    }

    pub fn is_allowed(&self, resource: &str, operation: &str) -> bool {
        self.0
            .get(resource)
            .and_then(|ops| ops.get(operation))
            .copied()
            .unwrap_or(false)
    }

    /// Flip one cell. Cells outside the catalog shape do not exist and are
    /// ignored.
    pub fn set(&mut self, resource: &str, operation: &str, allowed: bool) {
        if let Some(cell) = self.0.get_mut(resource).and_then(|ops| ops.get_mut(operation)) {
            *cell = allowed;
        }
    }
}
