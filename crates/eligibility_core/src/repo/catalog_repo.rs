//! Catalog item queries.
//!
//! # Responsibility
//! - Translate `CatalogFilter` into one OR-combined SQL predicate.
//! - Load single items for pointwise checks.
//!
//! # Invariants
//! - Level comparison uses `levels.number`, never the level row id.
//! - Matching returns identifiers only; item bodies stay in the store.

use crate::model::catalog::{CatalogFilter, CatalogItem, ItemId};
use crate::model::principal::ProgressionLevel;
use crate::repo::{parse_level_column, parse_uuid_column, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const ITEM_SELECT_SQL: &str = "SELECT
    ci.uuid,
    ci.title,
    ci.organization_uuid,
    l.number AS required_level
FROM catalog_items ci
LEFT JOIN levels l ON l.uuid = ci.level_uuid";

/// Read contract for the gated catalog.
pub trait CatalogStore {
    /// Returns identifiers of every item matching the tier disjunction.
    fn matching_items(&self, filter: &CatalogFilter) -> RepoResult<Vec<ItemId>>;
    /// Loads one item, or `None` when it is not part of the catalog.
    fn get_item(&self, id: ItemId) -> RepoResult<Option<CatalogItem>>;
}

impl<S: CatalogStore + ?Sized> CatalogStore for &S {
    fn matching_items(&self, filter: &CatalogFilter) -> RepoResult<Vec<ItemId>> {
        (**self).matching_items(filter)
    }

    fn get_item(&self, id: ItemId) -> RepoResult<Option<CatalogItem>> {
        (**self).get_item(id)
    }
}

/// SQLite-backed catalog store.
pub struct SqliteCatalogStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatalogStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CatalogStore for SqliteCatalogStore<'_> {
    fn matching_items(&self, filter: &CatalogFilter) -> RepoResult<Vec<ItemId>> {
        let mut sql = format!(
            "{ITEM_SELECT_SQL}
             WHERE (ci.organization_uuid IS NULL AND ci.level_uuid IS NULL)"
        );
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(org) = filter.organization_id {
            sql.push_str(" OR ci.organization_uuid = ?");
            bind_values.push(Value::Text(org.to_string()));
        }

        if let Some(level) = filter.max_level {
            sql.push_str(" OR (ci.level_uuid IS NOT NULL AND l.number <= ?)");
            bind_values.push(Value::Integer(i64::from(level.number())));
        }

        sql.push_str(" ORDER BY ci.uuid ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut ids = Vec::new();

        while let Some(row) = rows.next()? {
            let text: String = row.get("uuid")?;
            ids.push(parse_uuid_column(&text, "catalog_items.uuid")?);
        }

        Ok(ids)
    }

    fn get_item(&self, id: ItemId) -> RepoResult<Option<CatalogItem>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ITEM_SELECT_SQL} WHERE ci.uuid = ?1;"))?;

        let mut rows = stmt.query(params![id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_item_row(row)?));
        }

        Ok(None)
    }
}

fn parse_item_row(row: &Row<'_>) -> RepoResult<CatalogItem> {
    let id_text: String = row.get("uuid")?;
    let owner = row
        .get::<_, Option<String>>("organization_uuid")?
        .map(|text| parse_uuid_column(&text, "catalog_items.organization_uuid"))
        .transpose()?;
    let required_level = row
        .get::<_, Option<i64>>("required_level")?
        .map(|number| parse_level_column(number, "levels.number"))
        .transpose()?
        .map(ProgressionLevel);

    Ok(CatalogItem {
        id: parse_uuid_column(&id_text, "catalog_items.uuid")?,
        title: row.get("title")?,
        owning_organization_id: owner,
        required_level,
    })
}
