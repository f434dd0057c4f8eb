//! Gated catalog item model and tier predicate.
//!
//! # Responsibility
//! - Define catalog items and the visibility tiers they belong to.
//! - Define `CatalogFilter`, the tier disjunction shared by bulk SQL
//!   evaluation and single-item checks.
//!
//! # Invariants
//! - An item with neither owner nor level is public. An item with both is
//!   in both tiers and visible through either one.
//! - `CatalogFilter::matches` and the SQL rendering of the same filter must
//!   select exactly the same items.

use crate::model::principal::{OrganizationId, ProgressionLevel};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a catalog item.
pub type ItemId = Uuid;

/// Visibility tier an item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "tier", content = "value")]
pub enum CatalogTier {
    /// Visible to everyone.
    Public,
    /// Visible to active members of exactly this organization.
    Organization(OrganizationId),
    /// Visible to any principal whose level unlocks it, across organizations.
    Level(ProgressionLevel),
}

/// Gated catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub title: String,
    pub owning_organization_id: Option<OrganizationId>,
    pub required_level: Option<ProgressionLevel>,
}

impl CatalogItem {
    pub fn public(id: ItemId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            owning_organization_id: None,
            required_level: None,
        }
    }

    pub fn owned_by(id: ItemId, title: impl Into<String>, organization_id: OrganizationId) -> Self {
        Self {
            owning_organization_id: Some(organization_id),
            ..Self::public(id, title)
        }
    }

    pub fn gated_at(id: ItemId, title: impl Into<String>, level: ProgressionLevel) -> Self {
        Self {
            required_level: Some(level),
            ..Self::public(id, title)
        }
    }

    /// Tiers this item is visible through. Owned and gated items belong to
    /// both the organization and the level tier.
    pub fn tiers(&self) -> Vec<CatalogTier> {
        let mut tiers = Vec::with_capacity(2);
        if let Some(org) = self.owning_organization_id {
            tiers.push(CatalogTier::Organization(org));
        }
        if let Some(level) = self.required_level {
            tiers.push(CatalogTier::Level(level));
        }
        if tiers.is_empty() {
            tiers.push(CatalogTier::Public);
        }
        tiers
    }
}

/// Tier disjunction describing what one principal may see.
///
/// Always includes the public tier; `organization_id` and `max_level` add
/// the organization and level tiers when set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CatalogFilter {
    pub organization_id: Option<OrganizationId>,
    pub max_level: Option<ProgressionLevel>,
}

impl CatalogFilter {
    /// Filter matching public items only.
    pub fn public_only() -> Self {
        Self::default()
    }

    pub fn is_public_only(&self) -> bool {
        self.organization_id.is_none() && self.max_level.is_none()
    }

    /// Evaluates the disjunction against one item.
    pub fn matches(&self, item: &CatalogItem) -> bool {
        let public = item.owning_organization_id.is_none() && item.required_level.is_none();
        let owned = matches!(
            (self.organization_id, item.owning_organization_id),
            (Some(org), Some(owner)) if org == owner
        );
        let unlocked = matches!(
            (self.max_level, item.required_level),
            (Some(level), Some(required)) if level.unlocks(required)
        );
        public || owned || unlocked
    }
}

#[cfg(test)]
mod tests {
    use super::{CatalogFilter, CatalogItem, CatalogTier};
    use crate::model::principal::ProgressionLevel;
    use uuid::Uuid;

    #[test]
    fn tier_classification_follows_owner_and_level() {
        let org = Uuid::new_v4();
        assert_eq!(
            CatalogItem::public(Uuid::new_v4(), "a").tiers(),
            vec![CatalogTier::Public]
        );
        assert_eq!(
            CatalogItem::owned_by(Uuid::new_v4(), "b", org).tiers(),
            vec![CatalogTier::Organization(org)]
        );
        assert_eq!(
            CatalogItem::gated_at(Uuid::new_v4(), "c", ProgressionLevel(2)).tiers(),
            vec![CatalogTier::Level(ProgressionLevel(2))]
        );
    }

    #[test]
    fn owned_and_gated_item_is_in_both_tiers() {
        let org = Uuid::new_v4();
        let mut item = CatalogItem::owned_by(Uuid::new_v4(), "both", org);
        item.required_level = Some(ProgressionLevel(2));
        assert_eq!(
            item.tiers(),
            vec![
                CatalogTier::Organization(org),
                CatalogTier::Level(ProgressionLevel(2))
            ]
        );

        let member = CatalogFilter {
            organization_id: Some(org),
            max_level: None,
        };
        let outsider_at_level = CatalogFilter {
            organization_id: Some(Uuid::new_v4()),
            max_level: Some(ProgressionLevel(2)),
        };
        let outsider_below = CatalogFilter {
            organization_id: Some(Uuid::new_v4()),
            max_level: Some(ProgressionLevel(1)),
        };
        assert!(member.matches(&item));
        assert!(outsider_at_level.matches(&item));
        assert!(!outsider_below.matches(&item));
        assert!(!CatalogFilter::public_only().matches(&item));
    }

    #[test]
    fn public_only_filter_rejects_owned_and_gated_items() {
        let filter = CatalogFilter::public_only();
        assert!(filter.is_public_only());
        assert!(filter.matches(&CatalogItem::public(Uuid::new_v4(), "p")));
        assert!(!filter.matches(&CatalogItem::owned_by(Uuid::new_v4(), "o", Uuid::new_v4())));
        assert!(!filter.matches(&CatalogItem::gated_at(
            Uuid::new_v4(),
            "g",
            ProgressionLevel(0)
        )));
    }

    #[test]
    fn filter_matches_other_organizations_items_only_through_level() {
        let mine = Uuid::new_v4();
        let theirs = Uuid::new_v4();
        let filter = CatalogFilter {
            organization_id: Some(mine),
            max_level: Some(ProgressionLevel(2)),
        };

        assert!(filter.matches(&CatalogItem::owned_by(Uuid::new_v4(), "mine", mine)));
        assert!(!filter.matches(&CatalogItem::owned_by(Uuid::new_v4(), "theirs", theirs)));
        assert!(filter.matches(&CatalogItem::gated_at(
            Uuid::new_v4(),
            "l1",
            ProgressionLevel(1)
        )));
        assert!(!filter.matches(&CatalogItem::gated_at(
            Uuid::new_v4(),
            "l3",
            ProgressionLevel(3)
        )));
    }
}
