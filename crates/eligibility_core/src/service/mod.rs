//! Eligibility services.
//!
//! # Responsibility
//! - Resolve catalog visibility for one principal.
//! - Classify task deadlines for one batch scope.
//!
//! # Invariants
//! - Services are request-scoped: build one, query it, drop it.
//! - Store failures are propagated unchanged; missing affiliation or level is
//!   never an error.

use crate::model::catalog::ItemId;
use crate::model::task::{CohortId, TaskId};
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub mod deadline_service;
pub mod visibility_service;

pub type EligibilityResult<T> = Result<T, EligibilityError>;

/// A queried entity lies outside the scope the service was bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeMismatch {
    TaskNotInCohort { task_id: TaskId, cohort_id: CohortId },
    ItemNotInCatalog(ItemId),
}

impl Display for ScopeMismatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TaskNotInCohort { task_id, cohort_id } => {
                write!(f, "task {task_id} does not belong to cohort {cohort_id}")
            }
            Self::ItemNotInCatalog(id) => write!(f, "catalog item not found: {id}"),
        }
    }
}

/// Service-level error.
#[derive(Debug, Clone)]
pub enum EligibilityError {
    ScopeMismatch(ScopeMismatch),
    /// Backing store failed. Shared so a remembered failure can be returned
    /// to every later caller of the same cache.
    StoreUnavailable(Arc<RepoError>),
}

impl EligibilityError {
    pub fn is_scope_mismatch(&self) -> bool {
        matches!(self, Self::ScopeMismatch(_))
    }
}

impl Display for EligibilityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ScopeMismatch(mismatch) => write!(f, "{mismatch}"),
            Self::StoreUnavailable(err) => write!(f, "store unavailable: {err}"),
        }
    }
}

impl Error for EligibilityError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ScopeMismatch(_) => None,
            Self::StoreUnavailable(err) => Some(err.as_ref()),
        }
    }
}

impl From<RepoError> for EligibilityError {
    fn from(value: RepoError) -> Self {
        Self::StoreUnavailable(Arc::new(value))
    }
}

impl From<ScopeMismatch> for EligibilityError {
    fn from(value: ScopeMismatch) -> Self {
        Self::ScopeMismatch(value)
    }
}
