//! Community route handlers
//!
//! One POST endpoint per remote procedure. Handlers only move messages
//! between axum and the services.

use crate::error::ApiResult;
use crate::models::{
    CreateCommunityRequest, CreateCommunityResponse, DeleteCommunityRequest,
    DeleteCommunityResponse, GetAllCommunityRequest, GetAllCommunityResponse,
    GetCommunityRequest, GetCommunityResponse, IsCommunityValidRequest, IsCommunityValidResponse,
    JoinCommunityRequest, JoinCommunityResponse, LeaveCommunityRequest, LeaveCommunityResponse,
    UpdateCommunityRequest, UpdateCommunityResponse,
};
use crate::state::SharedState;
use axum::{extract::State, Json};

pub async fn create_community(
    State(state): State<SharedState>,
    Json(payload): Json<CreateCommunityRequest>,
) -> ApiResult<Json<CreateCommunityResponse>> {
    Ok(Json(state.communities.create_community(payload).await?))
}

pub async fn get_community(
    State(state): State<SharedState>,
    Json(payload): Json<GetCommunityRequest>,
) -> ApiResult<Json<GetCommunityResponse>> {
    Ok(Json(state.communities.get_community(payload).await?))
}

pub async fn list_communities(
    State(state): State<SharedState>,
    Json(payload): Json<GetAllCommunityRequest>,
) -> ApiResult<Json<GetAllCommunityResponse>> {
    Ok(Json(state.communities.get_all_communities(payload).await?))
}

pub async fn update_community(
    State(state): State<SharedState>,
    Json(payload): Json<UpdateCommunityRequest>,
) -> ApiResult<Json<UpdateCommunityResponse>> {
    Ok(Json(state.communities.update_community(payload).await?))
}

pub async fn delete_community(
    State(state): State<SharedState>,
    Json(payload): Json<DeleteCommunityRequest>,
) -> ApiResult<Json<DeleteCommunityResponse>> {
    Ok(Json(state.communities.delete_community(payload).await?))
}

pub async fn is_community_valid(
    State(state): State<SharedState>,
    Json(payload): Json<IsCommunityValidRequest>,
) -> ApiResult<Json<IsCommunityValidResponse>> {
    Ok(Json(state.communities.is_community_valid(payload).await?))
}

pub async fn join_community(
    State(state): State<SharedState>,
    Json(payload): Json<JoinCommunityRequest>,
) -> ApiResult<Json<JoinCommunityResponse>> {
    Ok(Json(state.memberships.join_community(payload).await?))
}

pub async fn leave_community(
    State(state): State<SharedState>,
    Json(payload): Json<LeaveCommunityRequest>,
) -> ApiResult<Json<LeaveCommunityResponse>> {
    Ok(Json(state.memberships.leave_community(payload).await?))
}
