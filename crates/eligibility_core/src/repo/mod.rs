//! Collaborator store contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define the read-side contracts the resolver and deadline cache consume.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Stores are read-only; nothing here mutates application data.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Predicates are evaluated in SQL; no store materializes the catalog.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod affiliation_repo;
pub mod catalog_repo;
pub mod level_repo;
pub mod task_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Backing store failure.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

fn parse_uuid_column(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn parse_level_column(value: i64, column: &str) -> RepoResult<u32> {
    u32::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid level number `{value}` in {column}")))
}
