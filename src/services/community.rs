//! Community RPC orchestration
//!
//! Maps request messages onto [`CommunityStore`] calls and store results
//! back onto response messages. Errors get one fixed prefix per operation.

use crate::db::community::{CommunityListFilter, CommunityStore, CommunityUpdateFilter, NewCommunity};
use crate::error::AppError;
use crate::models::{
    parse_community_id, parse_timestamp, Community, CreateCommunityRequest,
    CreateCommunityResponse, DeleteCommunityRequest, DeleteCommunityResponse,
    GetAllCommunityRequest, GetAllCommunityResponse, GetCommunityRequest, GetCommunityResponse,
    IsCommunityValidRequest, IsCommunityValidResponse, UpdateCommunityRequest,
    UpdateCommunityResponse,
};
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

pub struct CommunityService {
    store: Arc<dyn CommunityStore>,
}

impl CommunityService {
    pub fn new(store: Arc<dyn CommunityStore>) -> Self {
        Self { store }
    }

    pub async fn create_community(
        &self,
        req: CreateCommunityRequest,
    ) -> Result<CreateCommunityResponse, AppError> {
        debug!("Creating community: {}", req.community.name);

        // Store-assigned timestamps win; supplied ones only need to be well formed.
        for ts in [&req.community.created_at, &req.community.updated_at] {
            if !ts.is_empty() {
                parse_timestamp(ts).map_err(|e| e.context("error creating community"))?;
            }
        }

        let community = self
            .store
            .create(NewCommunity {
                name: req.community.name,
                description: req.community.description,
                location: req.community.location,
            })
            .await
            .map_err(|e| e.context("error creating community"))?;

        Ok(CreateCommunityResponse {
            community: community.into(),
        })
    }

    pub async fn get_community(
        &self,
        req: GetCommunityRequest,
    ) -> Result<GetCommunityResponse, AppError> {
        let result: Result<_, AppError> = async {
            let id = parse_community_id(&req.id)?;
            self.store.get_by_id(id).await
        }
        .await;

        let community = result.map_err(|e| e.context("error getting community"))?;
        Ok(GetCommunityResponse {
            community: community.into(),
        })
    }

    pub async fn get_all_communities(
        &self,
        req: GetAllCommunityRequest,
    ) -> Result<GetAllCommunityResponse, AppError> {
        req.validate()
            .map_err(|e| AppError::from(e).context("error getting communities"))?;

        let filter = CommunityListFilter {
            name: req.name,
            location: req.location,
            limit: req.limit,
            offset: req.offset,
        };

        let communities = self
            .store
            .list(filter)
            .await
            .map_err(|e| e.context("error getting communities"))?;

        Ok(GetAllCommunityResponse {
            communities: communities.into_iter().map(Community::from).collect(),
        })
    }

    pub async fn update_community(
        &self,
        req: UpdateCommunityRequest,
    ) -> Result<UpdateCommunityResponse, AppError> {
        let result: Result<_, AppError> = async {
            let filter = CommunityUpdateFilter {
                id: parse_community_id(&req.id)?,
                name: req.name,
                description: req.description,
                location: req.location,
            };
            self.store.update(filter).await
        }
        .await;

        let community = result.map_err(|e| e.context("error updating community"))?;
        Ok(UpdateCommunityResponse {
            community: community.into(),
        })
    }

    pub async fn delete_community(
        &self,
        req: DeleteCommunityRequest,
    ) -> Result<DeleteCommunityResponse, AppError> {
        let result: Result<_, AppError> = async {
            let id = parse_community_id(&req.id)?;
            self.store.delete(id).await
        }
        .await;

        result.map_err(|e| e.context("error deleting community"))?;
        Ok(DeleteCommunityResponse {
            message: "Community deleted successfully".to_string(),
        })
    }

    pub async fn is_community_valid(
        &self,
        req: IsCommunityValidRequest,
    ) -> Result<IsCommunityValidResponse, AppError> {
        let result: Result<_, AppError> = async {
            let id = parse_community_id(&req.id)?;
            self.store.is_valid(id).await
        }
        .await;

        let valid = result.map_err(|e| e.context("error validating community"))?;
        Ok(IsCommunityValidResponse { valid })
    }
}
