//! Tiered eligibility core.
//!
//! Resolves which gated catalog items a principal may view, and classifies
//! task deadlines for a batch scope from one bulk fetch.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, EligibilityConfig};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::catalog::{CatalogFilter, CatalogItem, CatalogTier, ItemId};
pub use model::principal::{
    Affiliation, OrganizationId, Principal, PrincipalId, ProgressionLevel,
};
pub use model::task::{CohortId, DeadlineStatus, TaskId};
pub use repo::affiliation_repo::{AffiliationRecord, AffiliationStore, SqliteAffiliationStore};
pub use repo::catalog_repo::{CatalogStore, SqliteCatalogStore};
pub use repo::level_repo::{LevelStore, SqliteLevelStore};
pub use repo::task_repo::{SqliteTaskDueDateSource, TaskDueDateSource};
pub use repo::{RepoError, RepoResult};
pub use service::deadline_service::{DeadlineCache, DeadlineEntry, DEFAULT_EXPIRING_WINDOW_DAYS};
pub use service::visibility_service::VisibilityResolver;
pub use service::{EligibilityError, EligibilityResult, ScopeMismatch};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
