use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use metafleet_core::model::{
    Environment, KafkaCluster, TenantProperties, TenantRecord, Team, Topic, UserProfile,
};
use metafleet_core::permission::{
    PermissionType, RolePermissions, build_role_permissions, default_role_permissions,
};
use metafleet_core::tenant::TenantId;

use crate::traits::{MetadataSource, SourceError};

/// Everything cached for one tenant. Sub-collections are always replaced
/// wholesale, never merged, so re-applying the same event is safe.
#[derive(Debug, Clone, Default)]
pub struct TenantSnapshot {
    pub teams: Vec<Team>,
    pub environments: Vec<Environment>,
    pub env_name_map: HashMap<String, String>,
    pub clusters: Vec<KafkaCluster>,
    pub role_permissions: RolePermissions,
    pub tenant: Option<TenantRecord>,
    pub properties: TenantProperties,
    pub topics: Vec<Topic>,
}

#[derive(Debug, Default)]
struct CacheState {
    users: Vec<UserProfile>,
    tenants: HashMap<TenantId, TenantSnapshot>,
}

/// Node-local cache of per-tenant operational metadata. The dispatcher is
/// the only writer; request handling reads concurrently. Each reload
/// fetches from the system of record first and swaps the affected
/// sub-collections under a single write-lock acquisition, so composite
/// reloads appear atomic to readers.
pub struct TenantCacheStore<S> {
    source: S,
    state: RwLock<CacheState>,
}

fn env_name_map(environments: &[Environment]) -> HashMap<String, String> {
    environments
        .iter()
        .map(|e| (e.id.clone(), e.name.clone()))
        .collect()
}

impl<S: MetadataSource> TenantCacheStore<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: RwLock::new(CacheState::default()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    // --- reload operations (writer path) ---

    pub async fn reload_users_all_tenants(&self) -> Result<(), SourceError> {
        let users = self.source.fetch_all_users().await?;
        self.state.write().unwrap().users = users;
        Ok(())
    }

    /// TEAM events: environments and the tenant-team mapping.
    pub async fn reload_teams_and_envs(&self, tenant_id: TenantId) -> Result<(), SourceError> {
        let environments = self.source.fetch_environments(tenant_id).await?;
        let teams = self.source.fetch_teams(tenant_id).await?;

        let mut state = self.state.write().unwrap();
        let snapshot = state.tenants.entry(tenant_id).or_default();
        snapshot.environments = environments;
        snapshot.teams = teams;
        Ok(())
    }

    pub async fn reload_clusters(&self, tenant_id: TenantId) -> Result<(), SourceError> {
        let clusters = self.source.fetch_clusters(tenant_id).await?;
        self.state
            .write()
            .unwrap()
            .tenants
            .entry(tenant_id)
            .or_default()
            .clusters = clusters;
        Ok(())
    }

    /// CLUSTER/DELETE: drop the tenant's cluster data. Derived queries such
    /// as the topic promotion order filter on live clusters, so dependent
    /// entries disappear with it.
    pub fn delete_cluster(&self, tenant_id: TenantId) {
        let mut state = self.state.write().unwrap();
        if let Some(snapshot) = state.tenants.get_mut(&tenant_id) {
            snapshot.clusters.clear();
        }
    }

    /// ENVIRONMENT/CREATE: environments, the environment map, and the
    /// tenant-team mapping, installed in one swap.
    pub async fn reload_environments_full(&self, tenant_id: TenantId) -> Result<(), SourceError> {
        let environments = self.source.fetch_environments(tenant_id).await?;
        let teams = self.source.fetch_teams(tenant_id).await?;

        let mut state = self.state.write().unwrap();
        let snapshot = state.tenants.entry(tenant_id).or_default();
        snapshot.env_name_map = env_name_map(&environments);
        snapshot.environments = environments;
        snapshot.teams = teams;
        Ok(())
    }

    /// ENVIRONMENT/DELETE: the environment map and the environment list.
    pub async fn reload_environments_after_delete(
        &self,
        tenant_id: TenantId,
    ) -> Result<(), SourceError> {
        let environments = self.source.fetch_environments(tenant_id).await?;

        let mut state = self.state.write().unwrap();
        let snapshot = state.tenants.entry(tenant_id).or_default();
        snapshot.env_name_map = env_name_map(&environments);
        snapshot.environments = environments;
        Ok(())
    }

    /// TENANT/CREATE: install static/default data for the new tenant.
    pub async fn init_tenant_defaults(&self, tenant_id: TenantId) -> Result<(), SourceError> {
        let tenant = self.source.fetch_tenant(tenant_id).await?;
        let properties = self.source.fetch_properties(tenant_id).await?;

        let mut state = self.state.write().unwrap();
        let snapshot = state.tenants.entry(tenant_id).or_default();
        snapshot.tenant = tenant;
        snapshot.properties = properties;
        snapshot.role_permissions = default_role_permissions();
        Ok(())
    }

    /// TENANT/DELETE: every cached collection for the tenant goes, including
    /// its entries in the cross-tenant user list.
    pub fn delete_tenant(&self, tenant_id: TenantId) {
        let mut state = self.state.write().unwrap();
        state.tenants.remove(&tenant_id);
        state.users.retain(|u| u.tenant_id != tenant_id);
    }

    pub async fn reload_tenant_record(&self, tenant_id: TenantId) -> Result<(), SourceError> {
        let tenant = self.source.fetch_tenant(tenant_id).await?;
        self.state
            .write()
            .unwrap()
            .tenants
            .entry(tenant_id)
            .or_default()
            .tenant = tenant;
        Ok(())
    }

    pub async fn reload_role_permissions(&self, tenant_id: TenantId) -> Result<(), SourceError> {
        let rows = self.source.fetch_role_permissions(tenant_id).await?;
        self.state
            .write()
            .unwrap()
            .tenants
            .entry(tenant_id)
            .or_default()
            .role_permissions = build_role_permissions(&rows);
        Ok(())
    }

    pub async fn reload_properties(&self, tenant_id: TenantId) -> Result<(), SourceError> {
        let properties = self.source.fetch_properties(tenant_id).await?;
        self.state
            .write()
            .unwrap()
            .tenants
            .entry(tenant_id)
            .or_default()
            .properties = properties;
        Ok(())
    }

    pub async fn reload_topics(&self, tenant_id: TenantId) -> Result<(), SourceError> {
        let topics = self.source.fetch_topics(tenant_id).await?;
        self.state
            .write()
            .unwrap()
            .tenants
            .entry(tenant_id)
            .or_default()
            .topics = topics;
        Ok(())
    }

    // --- read accessors ---
    //
    // Total over all tenant ids: an unknown tenant yields an empty or
    // default result. Cold cache is a normal state, not an error.

    pub fn users(&self) -> Vec<UserProfile> {
        self.state.read().unwrap().users.clone()
    }

    pub fn user(&self, username: &str) -> Option<UserProfile> {
        self.state
            .read()
            .unwrap()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
    }

    pub fn tenant_id_for(&self, username: &str) -> Option<TenantId> {
        self.user(username).map(|u| u.tenant_id)
    }

    pub fn team_id_for(&self, username: &str) -> Option<i32> {
        self.user(username).map(|u| u.team_id)
    }

    pub fn role_for(&self, username: &str) -> Option<String> {
        self.user(username).map(|u| u.role)
    }

    pub fn teams(&self, tenant_id: TenantId) -> Vec<Team> {
        self.with_snapshot(tenant_id, |s| s.teams.clone())
    }

    pub fn team_name(&self, tenant_id: TenantId, team_id: i32) -> Option<String> {
        self.with_snapshot(tenant_id, |s| {
            s.teams
                .iter()
                .find(|t| t.team_id == team_id)
                .map(|t| t.name.clone())
        })
    }

    /// Environments a team may operate in.
    pub fn allowed_envs(&self, tenant_id: TenantId, team_id: i32) -> HashSet<String> {
        self.with_snapshot(tenant_id, |s| {
            s.teams
                .iter()
                .find(|t| t.team_id == team_id)
                .map(|t| t.allowed_env_ids.iter().cloned().collect())
                .unwrap_or_default()
        })
    }

    pub fn environments(&self, tenant_id: TenantId) -> Vec<Environment> {
        self.with_snapshot(tenant_id, |s| s.environments.clone())
    }

    pub fn environment_name(&self, tenant_id: TenantId, env_id: &str) -> Option<String> {
        self.with_snapshot(tenant_id, |s| s.env_name_map.get(env_id).cloned())
    }

    pub fn clusters(&self, tenant_id: TenantId) -> Vec<KafkaCluster> {
        self.with_snapshot(tenant_id, |s| s.clusters.clone())
    }

    pub fn role_permissions(&self, tenant_id: TenantId) -> RolePermissions {
        self.with_snapshot(tenant_id, |s| s.role_permissions.clone())
    }

    pub fn permissions_for_role(
        &self,
        tenant_id: TenantId,
        role: &str,
    ) -> Option<HashSet<PermissionType>> {
        self.with_snapshot(tenant_id, |s| s.role_permissions.get(role).cloned())
    }

    pub fn tenant_record(&self, tenant_id: TenantId) -> Option<TenantRecord> {
        self.with_snapshot(tenant_id, |s| s.tenant.clone())
    }

    pub fn properties(&self, tenant_id: TenantId) -> TenantProperties {
        self.with_snapshot(tenant_id, |s| s.properties.clone())
    }

    pub fn topics(&self, tenant_id: TenantId) -> Vec<Topic> {
        self.with_snapshot(tenant_id, |s| s.topics.clone())
    }

    pub fn topics_named(&self, tenant_id: TenantId, name: &str) -> Vec<Topic> {
        self.with_snapshot(tenant_id, |s| {
            s.topics.iter().filter(|t| t.name == name).cloned().collect()
        })
    }

    /// Environment ids in topic promotion order, restricted to environments
    /// that exist and whose cluster is still cached. References to deleted
    /// clusters fall out of the result instead of erroring.
    pub fn topic_promotion_order(&self, tenant_id: TenantId) -> Vec<String> {
        self.with_snapshot(tenant_id, |s| {
            let live_clusters: HashSet<&str> =
                s.clusters.iter().map(|c| c.cluster_id.as_str()).collect();
            s.properties
                .topic_promotion_order
                .iter()
                .filter(|env_id| {
                    s.environments
                        .iter()
                        .any(|e| &e.id == *env_id && live_clusters.contains(e.cluster_id.as_str()))
                })
                .cloned()
                .collect()
        })
    }

    fn with_snapshot<T>(&self, tenant_id: TenantId, f: impl FnOnce(&TenantSnapshot) -> T) -> T
    where
        T: Default,
    {
        let state = self.state.read().unwrap();
        match state.tenants.get(&tenant_id) {
            Some(snapshot) => f(snapshot),
            None => T::default(),
        }
    }
}
