//! Membership orchestration
//!
//! Join and leave first resolve the user through the identity service and
//! only then touch `community_members`. A failed lookup ends the call before
//! any write. A failed write after a successful lookup is reported as is;
//! there is no compensation and the two steps are not atomic.

use crate::db::membership::MembershipStore;
use crate::error::{validation_error, AppError};
use crate::identity::UserDirectory;
use crate::models::{
    parse_community_id, JoinCommunityRequest, JoinCommunityResponse, LeaveCommunityRequest,
    LeaveCommunityResponse,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct MembershipService {
    users: Arc<dyn UserDirectory>,
    members: Arc<dyn MembershipStore>,
}

impl MembershipService {
    pub fn new(users: Arc<dyn UserDirectory>, members: Arc<dyn MembershipStore>) -> Self {
        Self { users, members }
    }

    pub async fn join_community(
        &self,
        req: JoinCommunityRequest,
    ) -> Result<JoinCommunityResponse, AppError> {
        debug!("User {:?} joining community {}", req.user_id, req.community_id);

        let message = self
            .join(&req.community_id, &req.user_id)
            .await
            .map_err(|e| {
                warn!("Join of community {} failed: {}", req.community_id, e);
                e.context("error joining community")
            })?;

        Ok(JoinCommunityResponse { message })
    }

    pub async fn leave_community(
        &self,
        req: LeaveCommunityRequest,
    ) -> Result<LeaveCommunityResponse, AppError> {
        debug!("User {:?} leaving community {}", req.user_id, req.community_id);

        let message = self
            .leave(&req.community_id, &req.user_id)
            .await
            .map_err(|e| {
                warn!("Leave of community {} failed: {}", req.community_id, e);
                e.context("error leaving community")
            })?;

        Ok(LeaveCommunityResponse { message })
    }

    async fn join(&self, community_id: &str, user_id: &str) -> Result<String, AppError> {
        if user_id.is_empty() {
            return Err(validation_error("user id is empty"));
        }
        let community_id = parse_community_id(community_id)?;

        let user = self.users.get_user_by_id(user_id.to_string()).await?;

        // Written under the resolved id, not the one the caller sent.
        let membership = self
            .members
            .join(community_id, user.user_id.clone(), Utc::now())
            .await?;

        info!("{} joined community {}", user.username, membership.community_id);
        Ok(format!(
            "{} successfully joined the community {}",
            user.username, membership.community_id
        ))
    }

    async fn leave(&self, community_id: &str, user_id: &str) -> Result<String, AppError> {
        if user_id.is_empty() {
            return Err(validation_error("user id is empty"));
        }
        let community_id = parse_community_id(community_id)?;

        let user = self.users.get_user_by_id(user_id.to_string()).await?;

        self.members.leave(community_id, user.user_id.clone()).await?;

        info!("{} left community {}", user.username, community_id);
        Ok(format!(
            "{} successfully left the community {}",
            user.username, community_id
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::membership::{DbMembership, MockMembershipStore};
    use crate::identity::{IdentityUser, MockUserDirectory};
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn alice(user_id: &str) -> IdentityUser {
        IdentityUser {
            user_id: user_id.to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn service(users: MockUserDirectory, members: MockMembershipStore) -> MembershipService {
        MembershipService::new(Arc::new(users), Arc::new(members))
    }

    fn join_request(community_id: Uuid, user_id: &str) -> JoinCommunityRequest {
        JoinCommunityRequest {
            community_id: community_id.to_string(),
            user_id: user_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_join_with_empty_user_never_calls_identity() {
        let mut users = MockUserDirectory::new();
        users.expect_get_user_by_id().never();
        let mut members = MockMembershipStore::new();
        members.expect_join().never();

        let err = service(users, members)
            .join_community(join_request(Uuid::new_v4(), ""))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            AppError::Validation("error joining community: user id is empty".into())
        );
    }

    #[tokio::test]
    async fn test_join_with_malformed_community_never_calls_identity() {
        let mut users = MockUserDirectory::new();
        users.expect_get_user_by_id().never();
        let mut members = MockMembershipStore::new();
        members.expect_join().never();

        let err = service(users, members)
            .join_community(JoinCommunityRequest {
                community_id: "not-a-uuid".into(),
                user_id: "u-1".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_join_lookup_failure_skips_write() {
        let mut users = MockUserDirectory::new();
        users
            .expect_get_user_by_id()
            .times(1)
            .returning(|id| Err(AppError::RemoteService(format!("user {} not found", id))));
        let mut members = MockMembershipStore::new();
        members.expect_join().never();

        let err = service(users, members)
            .join_community(join_request(Uuid::new_v4(), "ghost"))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            AppError::RemoteService("error joining community: user ghost not found".into())
        );
    }

    #[tokio::test]
    async fn test_join_success_uses_resolved_user() {
        let community_id = Uuid::new_v4();
        let before = Utc::now();
        let mut users = MockUserDirectory::new();
        users
            .expect_get_user_by_id()
            .withf(|id: &String| id == "U-1")
            .times(1)
            .returning(|_| Ok(alice("u-1")));
        let mut members = MockMembershipStore::new();
        members
            .expect_join()
            .withf(move |cid: &Uuid, uid: &String, at: &DateTime<Utc>| {
                *cid == community_id && uid == "u-1" && *at >= before
            })
            .times(1)
            .returning(|cid, uid, at| {
                Ok(DbMembership {
                    community_id: cid,
                    user_id: uid,
                    joined_at: at,
                    created_at: at,
                    updated_at: at,
                })
            });

        let resp = service(users, members)
            .join_community(join_request(community_id, "U-1"))
            .await
            .unwrap();

        assert_eq!(
            resp.message,
            format!("alice successfully joined the community {}", community_id)
        );
    }

    #[tokio::test]
    async fn test_join_store_failure_after_lookup_is_surfaced() {
        let mut users = MockUserDirectory::new();
        users
            .expect_get_user_by_id()
            .times(1)
            .returning(|id| Ok(alice(&id)));
        let mut members = MockMembershipStore::new();
        members.expect_join().times(1).returning(|_, _, _| {
            Err(AppError::Persistence(
                "Failed to join community: duplicate key value".into(),
            ))
        });

        let err = service(users, members)
            .join_community(join_request(Uuid::new_v4(), "u-1"))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            AppError::Persistence(
                "error joining community: Failed to join community: duplicate key value".into()
            )
        );
    }

    #[tokio::test]
    async fn test_leave_lookup_failure_skips_write() {
        let mut users = MockUserDirectory::new();
        users
            .expect_get_user_by_id()
            .times(1)
            .returning(|_| Err(AppError::RemoteService("connection refused".into())));
        let mut members = MockMembershipStore::new();
        members.expect_leave().never();

        let err = service(users, members)
            .leave_community(LeaveCommunityRequest {
                community_id: Uuid::new_v4().to_string(),
                user_id: "u-1".into(),
            })
            .await
            .unwrap_err();

        assert_eq!(
            err,
            AppError::RemoteService("error leaving community: connection refused".into())
        );
    }

    #[tokio::test]
    async fn test_leave_empty_user_is_rejected() {
        let mut users = MockUserDirectory::new();
        users.expect_get_user_by_id().never();
        let mut members = MockMembershipStore::new();
        members.expect_leave().never();

        let err = service(users, members)
            .leave_community(LeaveCommunityRequest {
                community_id: Uuid::new_v4().to_string(),
                user_id: String::new(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_leave_success_message() {
        let community_id = Uuid::new_v4();
        let mut users = MockUserDirectory::new();
        users
            .expect_get_user_by_id()
            .returning(|id| Ok(alice(&id)));
        let mut members = MockMembershipStore::new();
        members
            .expect_leave()
            .withf(move |cid: &Uuid, uid: &String| *cid == community_id && uid == "u-1")
            .times(1)
            .returning(|_, _| Ok(()));

        let resp = service(users, members)
            .leave_community(LeaveCommunityRequest {
                community_id: community_id.to_string(),
                user_id: "u-1".into(),
            })
            .await
            .unwrap();

        assert_eq!(
            resp.message,
            format!("alice successfully left the community {}", community_id)
        );
    }
}
