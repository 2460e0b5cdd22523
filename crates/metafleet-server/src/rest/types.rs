use serde::{Deserialize, Serialize};

use metafleet_auth::{CapabilityFlags, LoginContext};
use metafleet_core::model::TopicSummary;

#[derive(Debug, Deserialize)]
pub struct LoginRequestBody {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub captcha_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub session_id: String,
    pub username: String,
    pub role: String,
    pub tenant_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_name: Option<String>,
    pub team_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    pub switch_teams: bool,
    pub capabilities: CapabilitiesResponse,
}

impl LoginResponse {
    pub fn from_context(context: LoginContext) -> Self {
        Self {
            session_id: context.session_id.to_string(),
            username: context.username,
            role: context.role,
            tenant_id: context.tenant_id.value(),
            tenant_name: context.tenant_name,
            team_id: context.team_id,
            team_name: context.team_name,
            switch_teams: context.switch_teams,
            capabilities: context.capabilities.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CapabilitiesResponse {
    pub view_topics: bool,
    pub request_topics: bool,
    pub approve_topics: bool,
    pub sync_topics: bool,
    pub manage_users: bool,
    pub manage_clusters: bool,
    pub manage_environments: bool,
    pub manage_tenants: bool,
    pub superadmin: bool,
}

impl From<CapabilityFlags> for CapabilitiesResponse {
    fn from(flags: CapabilityFlags) -> Self {
        Self {
            view_topics: flags.view_topics,
            request_topics: flags.request_topics,
            approve_topics: flags.approve_topics,
            sync_topics: flags.sync_topics,
            manage_users: flags.manage_users,
            manage_clusters: flags.manage_clusters,
            manage_environments: flags.manage_environments,
            manage_tenants: flags.manage_tenants,
            superadmin: flags.superadmin,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProvisioningResponse {
    pub provisioning_required: bool,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct PermissionCheckRequest {
    pub username: String,
    /// Satisfied when the user holds at least one of these.
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PermissionCheckResponse {
    pub allowed: bool,
}

#[derive(Debug, Serialize)]
pub struct ResetCacheResponse {
    pub accepted: bool,
}

#[derive(Debug, Serialize)]
pub struct NotifyResponse {
    pub applied: bool,
}

#[derive(Debug, Serialize)]
pub struct PromotionOrderResponse {
    pub environments: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TopicSummaryResponse {
    pub name: String,
    pub team_id: i32,
    pub environments: Vec<String>,
}

impl From<TopicSummary> for TopicSummaryResponse {
    fn from(summary: TopicSummary) -> Self {
        let mut environments: Vec<String> = summary.environments.into_iter().collect();
        environments.sort();
        Self {
            name: summary.name,
            team_id: summary.team_id,
            environments,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
