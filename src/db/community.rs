//! Community persistence
//!
//! Owns every statement issued against the `communities` relation. Reads,
//! updates and lists only ever see active rows; delete is a soft delete.

use crate::db::queries::{
    SelectBuilder, UpdateBuilder, COMMUNITY_COLUMNS, COMMUNITY_EXISTS, GET_COMMUNITY,
    INSERT_COMMUNITY, SOFT_DELETE_COMMUNITY,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use tokio_postgres::Row;
use tracing::{debug, info};
use uuid::Uuid;

/// Community record as stored
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DbCommunity {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub location: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied fields for a new community
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewCommunity {
    pub name: String,
    pub description: String,
    pub location: String,
}

/// Partial update; each present field becomes one assignment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommunityUpdateFilter {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
}

/// Listing filter; each present field becomes one predicate or clause
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommunityListFilter {
    pub name: Option<String>,
    pub location: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommunityStore: Send + Sync {
    /// Insert a community, stamping both timestamps with the current time.
    async fn create(&self, community: NewCommunity) -> Result<DbCommunity, AppError>;

    /// Fetch one active community. Zero rows is a persistence error.
    async fn get_by_id(&self, id: Uuid) -> Result<DbCommunity, AppError>;

    /// Apply the present fields of `filter`. An empty filter is rejected
    /// before the store is touched.
    async fn update(&self, filter: CommunityUpdateFilter) -> Result<DbCommunity, AppError>;

    /// Soft delete. Unknown ids succeed without affecting any row.
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;

    async fn list(&self, filter: CommunityListFilter) -> Result<Vec<DbCommunity>, AppError>;

    async fn is_valid(&self, id: Uuid) -> Result<bool, AppError>;
}

/// Builds the partial update for `filter` in field declaration order
pub fn update_statement(
    filter: &CommunityUpdateFilter,
) -> Result<crate::db::queries::Statement, AppError> {
    UpdateBuilder::new("communities")
        .set("name", filter.name.clone())
        .set("description", filter.description.clone())
        .set("location", filter.location.clone())
        .build("id", filter.id, COMMUNITY_COLUMNS)
}

/// Builds the filtered listing for `filter` in field declaration order
pub fn list_statement(filter: &CommunityListFilter) -> crate::db::queries::Statement {
    SelectBuilder::new(COMMUNITY_COLUMNS, "communities")
        .filter_eq("name", filter.name.clone())
        .filter_eq("location", filter.location.clone())
        .order_by("created_at, id")
        .limit(filter.limit)
        .offset(filter.offset)
        .build()
}

fn community_from_row(row: &Row) -> Result<DbCommunity, AppError> {
    Ok(DbCommunity {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        location: row.try_get("location")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// PostgreSQL-backed community store
#[derive(Clone)]
pub struct PgCommunityStore {
    pool: Pool,
}

impl PgCommunityStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommunityStore for PgCommunityStore {
    async fn create(&self, community: NewCommunity) -> Result<DbCommunity, AppError> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::from(e).context("Failed to create community"))?;

        let now = Utc::now();
        let row = client
            .query_one(
                INSERT_COMMUNITY,
                &[&community.name, &community.description, &community.location, &now, &now],
            )
            .await
            .map_err(|e| AppError::from(e).context("Failed to create community"))?;

        let created = community_from_row(&row)?;
        info!("Community created: {} (id: {})", created.name, created.id);
        Ok(created)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<DbCommunity, AppError> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::from(e).context("Failed to get community"))?;

        let row = client
            .query_opt(GET_COMMUNITY, &[&id])
            .await
            .map_err(|e| AppError::from(e).context("Failed to get community"))?
            .ok_or_else(|| {
                AppError::Persistence(format!(
                    "Failed to get community: no active community with id {}",
                    id
                ))
            })?;

        community_from_row(&row)
    }

    async fn update(&self, filter: CommunityUpdateFilter) -> Result<DbCommunity, AppError> {
        // Built before checking out a connection so an empty filter never
        // reaches the database.
        let stmt = update_statement(&filter).map_err(|e| e.context("Failed to update community"))?;
        debug!("update query: {} ({} args)", stmt.sql, stmt.args.len());

        let client = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::from(e).context("Failed to update community"))?;

        let row = client
            .query_opt(stmt.sql.as_str(), &stmt.params())
            .await
            .map_err(|e| AppError::from(e).context("Failed to update community"))?
            .ok_or_else(|| {
                AppError::Persistence(format!(
                    "Failed to update community: no active community with id {}",
                    filter.id
                ))
            })?;

        let updated = community_from_row(&row)?;
        info!("Community updated: {}", updated.id);
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::from(e).context("Failed to delete community"))?;

        let affected = client
            .execute(SOFT_DELETE_COMMUNITY, &[&id])
            .await
            .map_err(|e| AppError::from(e).context("Failed to delete community"))?;

        // Zero affected rows is still reported as success.
        info!("Community {} soft-deleted ({} rows affected)", id, affected);
        Ok(())
    }

    async fn list(&self, filter: CommunityListFilter) -> Result<Vec<DbCommunity>, AppError> {
        let stmt = list_statement(&filter);
        debug!("list query: {} ({} args)", stmt.sql, stmt.args.len());

        let client = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::from(e).context("Failed to get communities"))?;

        let rows = client
            .query(stmt.sql.as_str(), &stmt.params())
            .await
            .map_err(|e| AppError::from(e).context("Failed to get communities"))?;

        let communities = rows
            .iter()
            .map(community_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.context("Failed to scan community"))?;

        debug!("Found {} communities", communities.len());
        Ok(communities)
    }

    async fn is_valid(&self, id: Uuid) -> Result<bool, AppError> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::from(e).context("Failed to validate community"))?;

        let row = client
            .query_one(COMMUNITY_EXISTS, &[&id])
            .await
            .map_err(|e| AppError::from(e).context("Failed to validate community"))?;

        Ok(row.try_get("is_valid")?)
    }
}
