//! Community and membership messages
//!
//! Wire shapes are fixed by the RPC schema: snake_case fields, ids as
//! strings, timestamps as RFC-3339 strings.

use crate::db::community::DbCommunity;
use crate::error::{validation_error, AppError};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Community as it crosses the wire
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Community {
    pub id: String,
    pub name: String,
    pub description: String,
    pub location: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<DbCommunity> for Community {
    fn from(c: DbCommunity) -> Self {
        Self {
            id: c.id.to_string(),
            name: c.name,
            description: c.description,
            location: c.location,
            created_at: format_timestamp(&c.created_at),
            updated_at: format_timestamp(&c.updated_at),
        }
    }
}

/// Format a stored timestamp for the wire
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse an RFC-3339 wire timestamp
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| validation_error(format!("invalid timestamp {:?}: {}", value, e)))
}

/// Parse a community id supplied by a caller
pub fn parse_community_id(value: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(value.trim())
        .map_err(|_| validation_error(format!("invalid community id {:?}", value)))
}

#[derive(Debug, Deserialize)]
pub struct CreateCommunityRequest {
    pub community: Community,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCommunityResponse {
    pub community: Community,
}

#[derive(Debug, Deserialize)]
pub struct GetCommunityRequest {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetCommunityResponse {
    pub community: Community,
}

/// Filtered listing; every field is optional
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct GetAllCommunityRequest {
    pub name: Option<String>,
    pub location: Option<String>,
    #[validate(range(min = 0, message = "limit must not be negative"))]
    pub limit: Option<i64>,
    #[validate(range(min = 0, message = "offset must not be negative"))]
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetAllCommunityResponse {
    pub communities: Vec<Community>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommunityRequest {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateCommunityResponse {
    pub community: Community,
}

#[derive(Debug, Deserialize)]
pub struct DeleteCommunityRequest {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteCommunityResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct IsCommunityValidRequest {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IsCommunityValidResponse {
    pub valid: bool,
}

#[derive(Debug, Deserialize)]
pub struct JoinCommunityRequest {
    pub community_id: String,
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinCommunityResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct LeaveCommunityRequest {
    pub community_id: String,
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LeaveCommunityResponse {
    pub message: String,
}
