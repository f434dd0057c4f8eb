//! Organization progression lookup.

use crate::model::principal::{OrganizationId, ProgressionLevel};
use crate::repo::{parse_level_column, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Read contract for organization progression.
pub trait LevelStore {
    /// Returns the organization's maximum unlocked level.
    ///
    /// `None` covers both "nothing unlocked" and "unknown organization".
    fn maximum_level(&self, organization_id: OrganizationId)
        -> RepoResult<Option<ProgressionLevel>>;
}

impl<S: LevelStore + ?Sized> LevelStore for &S {
    fn maximum_level(
        &self,
        organization_id: OrganizationId,
    ) -> RepoResult<Option<ProgressionLevel>> {
        (**self).maximum_level(organization_id)
    }
}

/// SQLite-backed level store.
pub struct SqliteLevelStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLevelStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl LevelStore for SqliteLevelStore<'_> {
    fn maximum_level(
        &self,
        organization_id: OrganizationId,
    ) -> RepoResult<Option<ProgressionLevel>> {
        let number = self
            .conn
            .query_row(
                "SELECT l.number
                 FROM organizations o
                 LEFT JOIN levels l ON l.uuid = o.maximum_level_uuid
                 WHERE o.uuid = ?1;",
                params![organization_id.to_string()],
                |row| row.get::<_, Option<i64>>(0),
            )
            .optional()?
            .flatten();

        number
            .map(|value| parse_level_column(value, "levels.number").map(ProgressionLevel))
            .transpose()
    }
}
