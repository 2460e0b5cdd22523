use std::collections::HashMap;
use std::sync::Mutex;

use metafleet_core::model::{
    Environment, KafkaCluster, TenantProperties, TenantRecord, Team, Topic, UserProfile,
};
use metafleet_core::permission::RolePermissionRow;
use metafleet_core::tenant::TenantId;

use crate::traits::{MetadataSource, SourceError};

#[derive(Debug, Default)]
struct Inner {
    users: Vec<UserProfile>,
    teams: HashMap<TenantId, Vec<Team>>,
    environments: HashMap<TenantId, Vec<Environment>>,
    clusters: HashMap<TenantId, Vec<KafkaCluster>>,
    tenants: HashMap<TenantId, TenantRecord>,
    role_rows: HashMap<TenantId, Vec<RolePermissionRow>>,
    properties: HashMap<TenantId, TenantProperties>,
    topics: HashMap<TenantId, Vec<Topic>>,
    failure: Option<SourceError>,
}

/// In-process system of record. Backs single-node deployments and tests;
/// a persistent implementation plugs in through the same trait.
#[derive(Debug, Default)]
pub struct InMemorySource {
    inner: Mutex<Inner>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_user(&self, user: UserProfile) {
        let mut inner = self.inner.lock().unwrap();
        inner.users.retain(|u| u.username != user.username);
        inner.users.push(user);
    }

    pub fn remove_user(&self, username: &str) {
        self.inner
            .lock()
            .unwrap()
            .users
            .retain(|u| u.username != username);
    }

    pub fn clear_users(&self) {
        self.inner.lock().unwrap().users.clear();
    }

    pub fn put_team(&self, team: Team) {
        let mut inner = self.inner.lock().unwrap();
        inner.teams.entry(team.tenant_id).or_default().push(team);
    }

    pub fn put_environment(&self, tenant_id: TenantId, environment: Environment) {
        self.inner
            .lock()
            .unwrap()
            .environments
            .entry(tenant_id)
            .or_default()
            .push(environment);
    }

    pub fn clear_environments(&self, tenant_id: TenantId) {
        self.inner.lock().unwrap().environments.remove(&tenant_id);
    }

    pub fn put_cluster(&self, tenant_id: TenantId, cluster: KafkaCluster) {
        self.inner
            .lock()
            .unwrap()
            .clusters
            .entry(tenant_id)
            .or_default()
            .push(cluster);
    }

    pub fn put_tenant(&self, record: TenantRecord) {
        self.inner
            .lock()
            .unwrap()
            .tenants
            .insert(record.tenant_id, record);
    }

    pub fn put_role_permission(&self, tenant_id: TenantId, row: RolePermissionRow) {
        self.inner
            .lock()
            .unwrap()
            .role_rows
            .entry(tenant_id)
            .or_default()
            .push(row);
    }

    pub fn put_properties(&self, tenant_id: TenantId, properties: TenantProperties) {
        self.inner
            .lock()
            .unwrap()
            .properties
            .insert(tenant_id, properties);
    }

    pub fn put_topic(&self, tenant_id: TenantId, topic: Topic) {
        self.inner
            .lock()
            .unwrap()
            .topics
            .entry(tenant_id)
            .or_default()
            .push(topic);
    }

    /// Make every subsequent fetch fail, until cleared with `None`.
    pub fn set_failure(&self, failure: Option<SourceError>) {
        self.inner.lock().unwrap().failure = failure;
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, Inner>, SourceError> {
        let inner = self.inner.lock().unwrap();
        match &inner.failure {
            Some(err) => Err(err.clone()),
            None => Ok(inner),
        }
    }
}

impl MetadataSource for InMemorySource {
    async fn fetch_all_users(&self) -> Result<Vec<UserProfile>, SourceError> {
        Ok(self.guard()?.users.clone())
    }

    async fn fetch_teams(&self, tenant_id: TenantId) -> Result<Vec<Team>, SourceError> {
        Ok(self.guard()?.teams.get(&tenant_id).cloned().unwrap_or_default())
    }

    async fn fetch_environments(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<Environment>, SourceError> {
        Ok(self
            .guard()?
            .environments
            .get(&tenant_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_clusters(&self, tenant_id: TenantId) -> Result<Vec<KafkaCluster>, SourceError> {
        Ok(self
            .guard()?
            .clusters
            .get(&tenant_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_tenant(&self, tenant_id: TenantId) -> Result<Option<TenantRecord>, SourceError> {
        Ok(self.guard()?.tenants.get(&tenant_id).cloned())
    }

    async fn fetch_role_permissions(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<RolePermissionRow>, SourceError> {
        Ok(self
            .guard()?
            .role_rows
            .get(&tenant_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_properties(
        &self,
        tenant_id: TenantId,
    ) -> Result<TenantProperties, SourceError> {
        Ok(self
            .guard()?
            .properties
            .get(&tenant_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_topics(&self, tenant_id: TenantId) -> Result<Vec<Topic>, SourceError> {
        Ok(self.guard()?.topics.get(&tenant_id).cloned().unwrap_or_default())
    }
}
