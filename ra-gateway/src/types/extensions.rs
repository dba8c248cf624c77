use std::sync::Arc;

use uuid::Uuid;

use super::{
    agent::{Agent, Skill},
    config::{RequestConfigPreProcessed, ResolvedTarget},
};

/// Authenticated caller identity, inserted by the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Present for session-cookie callers; bearer-token callers are
    /// anonymous.
    pub user_id: Option<Uuid>,
}

/// Everything the pipeline needs about one request, bound by the
/// request-context middleware before dispatch.
#[derive(Debug)]
pub struct RequestContext {
    pub config: RequestConfigPreProcessed,
    pub target: ResolvedTarget,
    pub agent: Agent,
    pub skill: Skill,
}

pub type SharedRequestContext = Arc<RequestContext>;
