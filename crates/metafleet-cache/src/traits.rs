use metafleet_core::model::{
    Environment, KafkaCluster, TenantProperties, TenantRecord, Team, Topic, UserProfile,
};
use metafleet_core::permission::RolePermissionRow;
use metafleet_core::tenant::TenantId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("system of record unavailable: {0}")]
    Unavailable(String),
}

/// Authoritative per-tenant data, queried on every cache reload. The
/// persistence behind it is an external collaborator; only the query
/// surface is modeled here.
pub trait MetadataSource: Send + Sync {
    fn fetch_all_users(&self)
    -> impl Future<Output = Result<Vec<UserProfile>, SourceError>> + Send;

    fn fetch_teams(
        &self,
        tenant_id: TenantId,
    ) -> impl Future<Output = Result<Vec<Team>, SourceError>> + Send;

    fn fetch_environments(
        &self,
        tenant_id: TenantId,
    ) -> impl Future<Output = Result<Vec<Environment>, SourceError>> + Send;

    fn fetch_clusters(
        &self,
        tenant_id: TenantId,
    ) -> impl Future<Output = Result<Vec<KafkaCluster>, SourceError>> + Send;

    fn fetch_tenant(
        &self,
        tenant_id: TenantId,
    ) -> impl Future<Output = Result<Option<TenantRecord>, SourceError>> + Send;

    fn fetch_role_permissions(
        &self,
        tenant_id: TenantId,
    ) -> impl Future<Output = Result<Vec<RolePermissionRow>, SourceError>> + Send;

    fn fetch_properties(
        &self,
        tenant_id: TenantId,
    ) -> impl Future<Output = Result<TenantProperties, SourceError>> + Send;

    fn fetch_topics(
        &self,
        tenant_id: TenantId,
    ) -> impl Future<Output = Result<Vec<Topic>, SourceError>> + Send;
}
