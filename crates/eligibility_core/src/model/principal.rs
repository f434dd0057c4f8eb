//! Principal and affiliation model.
//!
//! # Responsibility
//! - Describe who is asking: identity, organization membership, progression.
//!
//! # Invariants
//! - A terminated affiliation is kept for history but grants nothing.
//! - `ProgressionLevel` ordering is the only comparison used for level gating.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a principal (user).
pub type PrincipalId = Uuid;

/// Stable identifier of an organization.
pub type OrganizationId = Uuid;

/// Ordinal progression rank.
///
/// Level gating is upward-closed: a principal at level `n` unlocks every item
/// requiring `0..=n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressionLevel(pub u32);

impl ProgressionLevel {
    pub fn number(self) -> u32 {
        self.0
    }

    /// Returns whether this level grants content gated at `required`.
    pub fn unlocks(self, required: ProgressionLevel) -> bool {
        self >= required
    }
}

impl Display for ProgressionLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Membership link between a principal and one organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affiliation {
    pub organization_id: OrganizationId,
    /// `false` once the affiliation has been terminated (dropped out).
    pub is_active: bool,
}

impl Affiliation {
    pub fn active(organization_id: OrganizationId) -> Self {
        Self {
            organization_id,
            is_active: true,
        }
    }

    pub fn terminated(organization_id: OrganizationId) -> Self {
        Self {
            organization_id,
            is_active: false,
        }
    }
}

/// Requesting identity as seen by the visibility resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    pub affiliation: Option<Affiliation>,
    /// `None` means no progression unlocked.
    pub level: Option<ProgressionLevel>,
}

impl Principal {
    pub fn new(id: PrincipalId) -> Self {
        Self {
            id,
            affiliation: None,
            level: None,
        }
    }

    /// Principal without identity-bound grants, used for unauthenticated reads.
    pub fn anonymous() -> Self {
        Self::new(Uuid::nil())
    }

    pub fn with_affiliation(mut self, affiliation: Affiliation) -> Self {
        self.affiliation = Some(affiliation);
        self
    }

    pub fn with_level(mut self, level: ProgressionLevel) -> Self {
        self.level = Some(level);
        self
    }

    /// Returns the affiliation only when it has not been terminated.
    pub fn active_affiliation(&self) -> Option<&Affiliation> {
        self.affiliation
            .as_ref()
            .filter(|affiliation| affiliation.is_active)
    }

    /// Returns the level that currently gates content for this principal.
    ///
    /// Without an active affiliation no level applies, whatever was recorded.
    pub fn effective_level(&self) -> Option<ProgressionLevel> {
        self.active_affiliation().and(self.level)
    }
}
