//! Principal affiliation lookup.

use crate::model::principal::{OrganizationId, PrincipalId, ProgressionLevel};
use crate::repo::{parse_level_column, parse_uuid_column, RepoResult};
use rusqlite::{params, Connection};

/// Affiliation row as stored, including the principal's own recorded level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AffiliationRecord {
    pub organization_id: OrganizationId,
    pub is_active: bool,
    pub current_level: Option<ProgressionLevel>,
}

/// Read contract for principal-to-organization membership.
pub trait AffiliationStore {
    /// Returns `None` when the principal has never been affiliated.
    fn affiliation(&self, principal_id: PrincipalId) -> RepoResult<Option<AffiliationRecord>>;
}

impl<S: AffiliationStore + ?Sized> AffiliationStore for &S {
    fn affiliation(&self, principal_id: PrincipalId) -> RepoResult<Option<AffiliationRecord>> {
        (**self).affiliation(principal_id)
    }
}

/// SQLite-backed affiliation store.
pub struct SqliteAffiliationStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAffiliationStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AffiliationStore for SqliteAffiliationStore<'_> {
    fn affiliation(&self, principal_id: PrincipalId) -> RepoResult<Option<AffiliationRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                a.organization_uuid,
                a.terminated_at,
                l.number AS current_level
             FROM affiliations a
             LEFT JOIN levels l ON l.uuid = a.current_level_uuid
             WHERE a.principal_uuid = ?1;",
        )?;

        let mut rows = stmt.query(params![principal_id.to_string()])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let org_text: String = row.get("organization_uuid")?;
        let terminated_at: Option<i64> = row.get("terminated_at")?;
        let current_level = row
            .get::<_, Option<i64>>("current_level")?
            .map(|number| parse_level_column(number, "levels.number"))
            .transpose()?
            .map(ProgressionLevel);

        Ok(Some(AffiliationRecord {
            organization_id: parse_uuid_column(&org_text, "affiliations.organization_uuid")?,
            is_active: terminated_at.is_none(),
            current_level,
        }))
    }
}
