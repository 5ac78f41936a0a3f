//! Application state management
//!
//! Contains shared state accessible across all handlers. Holds no mutable
//! state of its own; everything mutable lives in PostgreSQL.

use crate::config::Settings;
use crate::db::community::PgCommunityStore;
use crate::db::membership::PgMembershipStore;
use crate::error::AppError;
use crate::identity::HttpUserDirectory;
use crate::services::{CommunityService, MembershipService};
use deadpool_postgres::Pool;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    pub communities: CommunityService,
    pub memberships: MembershipService,
}

impl AppState {
    pub fn new(communities: CommunityService, memberships: MembershipService) -> Self {
        Self {
            communities,
            memberships,
        }
    }

    /// Wire the PostgreSQL stores and the HTTP identity client
    pub fn from_pool(pool: Pool, settings: &Settings) -> Result<Self, AppError> {
        let users = Arc::new(HttpUserDirectory::new(&settings.identity)?);
        let communities = CommunityService::new(Arc::new(PgCommunityStore::new(pool.clone())));
        let memberships = MembershipService::new(users, Arc::new(PgMembershipStore::new(pool)));

        Ok(Self::new(communities, memberships))
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
