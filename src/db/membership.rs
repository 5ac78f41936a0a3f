//! Community membership persistence
//!
//! Join inserts a row into `community_members`; leave soft-deletes it.
//! Duplicate active memberships are rejected by the partial unique index,
//! not by a prior lookup.

use crate::db::queries::{INSERT_MEMBERSHIP, SOFT_DELETE_MEMBERSHIP};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use tokio_postgres::Row;
use tracing::info;
use uuid::Uuid;

/// Membership row as stored
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DbMembership {
    pub community_id: Uuid,
    pub user_id: String,
    pub joined_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Insert a membership with the caller-supplied join time.
    async fn join(
        &self,
        community_id: Uuid,
        user_id: String,
        joined_at: DateTime<Utc>,
    ) -> Result<DbMembership, AppError>;

    /// Soft-delete the active membership for the key. Succeeds even when no
    /// membership existed.
    async fn leave(&self, community_id: Uuid, user_id: String) -> Result<(), AppError>;
}

fn membership_from_row(row: &Row) -> Result<DbMembership, AppError> {
    Ok(DbMembership {
        community_id: row.try_get("community_id")?,
        user_id: row.try_get("user_id")?,
        joined_at: row.try_get("joined_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// PostgreSQL-backed membership store
#[derive(Clone)]
pub struct PgMembershipStore {
    pool: Pool,
}

impl PgMembershipStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipStore for PgMembershipStore {
    async fn join(
        &self,
        community_id: Uuid,
        user_id: String,
        joined_at: DateTime<Utc>,
    ) -> Result<DbMembership, AppError> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::from(e).context("Failed to join community"))?;

        let row = client
            .query_one(INSERT_MEMBERSHIP, &[&community_id, &user_id, &joined_at])
            .await
            .map_err(|e| AppError::from(e).context("Failed to join community"))?;

        let membership = membership_from_row(&row)?;
        info!("User {} joined community {}", membership.user_id, membership.community_id);
        Ok(membership)
    }

    async fn leave(&self, community_id: Uuid, user_id: String) -> Result<(), AppError> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::from(e).context("Failed to execute the leave community query"))?;

        let affected = client
            .execute(SOFT_DELETE_MEMBERSHIP, &[&community_id, &user_id])
            .await
            .map_err(|e| AppError::from(e).context("Failed to execute the leave community query"))?;

        info!(
            "User {} left community {} ({} rows affected)",
            user_id, community_id, affected
        );
        Ok(())
    }
}
