//! User identity service client
//!
//! The community service never stores users. Membership operations resolve
//! the user through [`UserDirectory`], implemented in production by an HTTP
//! client for the user management service.

use crate::config::IdentityConfig;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// User as returned by the identity service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityUser {
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Lookup of users owned by the identity service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetch a user by id. An unknown user is a remote service error.
    async fn get_user_by_id(&self, user_id: String) -> Result<IdentityUser, AppError>;
}

/// HTTP client for the user management service
#[derive(Clone)]
pub struct HttpUserDirectory {
    client: Client,
    base_url: String,
}

impl HttpUserDirectory {
    pub fn new(config: &IdentityConfig) -> Result<Self, AppError> {
        // The request timeout is the only deadline on the remote call.
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build identity client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn user_url(&self, user_id: &str) -> Result<reqwest::Url, AppError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| AppError::Config(format!("Invalid identity service URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Config("Identity service URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["users", user_id]);
        Ok(url)
    }
}

#[async_trait]
impl UserDirectory for HttpUserDirectory {
    async fn get_user_by_id(&self, user_id: String) -> Result<IdentityUser, AppError> {
        let url = self.user_url(&user_id)?;
        debug!("Resolving user {} via {}", user_id, url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::RemoteService(e.to_string()))?;

        match response.status() {
            status if status.is_success() => response
                .json::<IdentityUser>()
                .await
                .map_err(|e| AppError::RemoteService(format!("invalid user payload: {}", e))),
            StatusCode::NOT_FOUND => Err(AppError::RemoteService(format!(
                "user {} not found",
                user_id
            ))),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(AppError::RemoteService(format!(
                    "identity service returned {}: {}",
                    status, body
                )))
            }
        }
    }
}
