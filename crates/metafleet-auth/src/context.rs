use std::collections::HashSet;

use uuid::Uuid;

use metafleet_cache::{MetadataSource, TenantCacheStore};
use metafleet_core::permission::PermissionType;
use metafleet_core::tenant::TenantId;

use crate::orchestrator::VerifiedIdentity;

/// UI-facing capability switches derived from a role's permission set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapabilityFlags {
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

impl CapabilityFlags {
    pub fn from_permissions(permissions: &HashSet<PermissionType>) -> Self {
        Self {
            view_topics: permissions.contains(&PermissionType::ViewTopics),
            request_topics: permissions.contains(&PermissionType::RequestCreateTopics)
                || permissions.contains(&PermissionType::RequestDeleteTopics),
            approve_topics: permissions.contains(&PermissionType::ApproveTopics),
            sync_topics: permissions.contains(&PermissionType::SyncTopics),
            manage_users: permissions.contains(&PermissionType::AddUser),
            manage_clusters: permissions.contains(&PermissionType::ManageClusters),
            manage_environments: permissions.contains(&PermissionType::ManageEnvironments),
            manage_tenants: permissions.contains(&PermissionType::ManageTenants),
            superadmin: permissions.contains(&PermissionType::ShutdownSystem),
        }
    }
}

/// Everything a freshly authenticated session needs, resolved once at
/// login from the caches so request handling never re-derives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginContext {
    pub session_id: Uuid,
    pub username: String,
    pub role: String,
    pub tenant_id: TenantId,
    pub tenant_name: Option<String>,
    pub team_id: i32,
    pub team_name: Option<String>,
    pub switch_teams: bool,
    pub capabilities: CapabilityFlags,
}

/// Resolve a verified identity into a full login context. Missing cache
/// entries degrade to empty capabilities rather than failing the login.
pub fn build_login_context<S: MetadataSource>(
    store: &TenantCacheStore<S>,
    identity: &VerifiedIdentity,
) -> LoginContext {
    let permissions = store
        .permissions_for_role(identity.tenant_id, &identity.role)
        .unwrap_or_default();
    let switch_teams = store
        .user(&identity.username)
        .map(|u| u.switch_teams)
        .unwrap_or(false);

    LoginContext {
        session_id: Uuid::new_v4(),
        username: identity.username.clone(),
        role: identity.role.clone(),
        tenant_id: identity.tenant_id,
        tenant_name: store.tenant_record(identity.tenant_id).map(|t| t.name),
        team_id: identity.team_id,
        team_name: store.team_name(identity.tenant_id, identity.team_id),
        switch_teams,
        capabilities: CapabilityFlags::from_permissions(&permissions),
    }
}
