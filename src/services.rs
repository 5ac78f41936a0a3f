//! Orchestration between the RPC layer, the stores and the identity service

pub mod community;
pub mod membership;

pub use community::CommunityService;
pub use membership::MembershipService;
