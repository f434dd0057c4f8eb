//! Tiered catalog visibility.
//!
//! # Responsibility
//! - Load a principal's affiliation and progression from collaborator stores.
//! - Build the tier disjunction and evaluate it in bulk or for one item.
//!
//! # Invariants
//! - Visible set = public tier ∪ organization tier ∪ level tier.
//! - A terminated affiliation disables both the organization and level tiers.
//! - `is_visible(p, i)` holds exactly when `i.id ∈ resolve(p)`.
//! - Level-gated items are shared across organizations.

use crate::model::catalog::{CatalogFilter, CatalogItem, ItemId};
use crate::model::principal::{Affiliation, Principal, PrincipalId};
use crate::repo::affiliation_repo::AffiliationStore;
use crate::repo::catalog_repo::CatalogStore;
use crate::repo::level_repo::LevelStore;
use crate::service::{EligibilityResult, ScopeMismatch};
use log::{debug, info};
use std::collections::HashSet;
use std::time::Instant;

/// Request-scoped visibility resolver.
pub struct VisibilityResolver<C, A, L> {
    catalog: C,
    affiliations: A,
    levels: L,
}

impl<C, A, L> VisibilityResolver<C, A, L>
where
    C: CatalogStore,
    A: AffiliationStore,
    L: LevelStore,
{
    pub fn new(catalog: C, affiliations: A, levels: L) -> Self {
        Self {
            catalog,
            affiliations,
            levels,
        }
    }

    /// Builds the principal view used by tier evaluation.
    ///
    /// The level is the principal's own recorded level, falling back to the
    /// organization's maximum unlocked level. Terminated affiliations skip
    /// the level lookup since they grant nothing.
    pub fn load_principal(&self, principal_id: PrincipalId) -> EligibilityResult<Principal> {
        let mut principal = Principal::new(principal_id);
        let Some(record) = self.affiliations.affiliation(principal_id)? else {
            return Ok(principal);
        };

        principal.affiliation = Some(Affiliation {
            organization_id: record.organization_id,
            is_active: record.is_active,
        });
        if record.is_active {
            principal.level = match record.current_level {
                Some(level) => Some(level),
                None => self.levels.maximum_level(record.organization_id)?,
            };
        }

        Ok(principal)
    }

    /// Returns the tier disjunction for `principal`.
    pub fn catalog_filter(&self, principal: &Principal) -> CatalogFilter {
        CatalogFilter {
            organization_id: principal
                .active_affiliation()
                .map(|affiliation| affiliation.organization_id),
            max_level: principal.effective_level(),
        }
    }

    /// Returns every catalog item `principal` may view.
    pub fn resolve(&self, principal: &Principal) -> EligibilityResult<HashSet<ItemId>> {
        let started_at = Instant::now();
        let filter = self.catalog_filter(principal);
        let visible: HashSet<ItemId> = self.catalog.matching_items(&filter)?.into_iter().collect();

        info!(
            "event=visibility_resolve module=service status=ok public_only={} level={} visible={} duration_ms={}",
            filter.is_public_only(),
            filter
                .max_level
                .map_or_else(|| "none".to_string(), |level| level.to_string()),
            visible.len(),
            started_at.elapsed().as_millis()
        );
        Ok(visible)
    }

    /// Loads the principal, then resolves its visible set.
    pub fn resolve_for(&self, principal_id: PrincipalId) -> EligibilityResult<HashSet<ItemId>> {
        let principal = self.load_principal(principal_id)?;
        self.resolve(&principal)
    }

    /// Tests one item against the tiers without touching the catalog store.
    pub fn is_visible(&self, principal: &Principal, item: &CatalogItem) -> bool {
        self.catalog_filter(principal).matches(item)
    }

    /// Loads one item by id and tests it.
    ///
    /// # Errors
    /// - `ScopeMismatch::ItemNotInCatalog` when the id is unknown.
    pub fn is_visible_by_id(
        &self,
        principal: &Principal,
        item_id: ItemId,
    ) -> EligibilityResult<bool> {
        let item = self
            .catalog
            .get_item(item_id)?
            .ok_or(ScopeMismatch::ItemNotInCatalog(item_id))?;
        let visible = self.is_visible(principal, &item);
        debug!(
            "event=visibility_check module=service status=ok visible={}",
            visible
        );
        Ok(visible)
    }
}
