use std::collections::HashSet;
use std::sync::Arc;

use metafleet_cache::{MetadataSource, TenantCacheStore};
use metafleet_core::permission::PermissionType;
use metafleet_core::principal::{Principal, PrincipalAttributes};
use metafleet_core::tenant::TenantId;

/// Answers "may this principal do X" from the caches, fail closed: any
/// link missing from principal to permission set yields no permissions.
pub struct AuthorizationEvaluator<S> {
    store: Arc<TenantCacheStore<S>>,
    attributes: PrincipalAttributes,
    /// When set, a role asserted by the principal's granted authorities
    /// overrides the cached user record.
    directory_authority: bool,
}

impl<S: MetadataSource> AuthorizationEvaluator<S> {
    pub fn new(store: Arc<TenantCacheStore<S>>) -> Self {
        Self {
            store,
            attributes: PrincipalAttributes::default(),
            directory_authority: false,
        }
    }

    pub fn with_attributes(mut self, attributes: PrincipalAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_directory_authority(mut self, enabled: bool) -> Self {
        self.directory_authority = enabled;
        self
    }

    pub fn username<'a>(&self, principal: &'a Principal) -> Option<&'a str> {
        principal.username(&self.attributes)
    }

    pub fn tenant_of(&self, principal: &Principal) -> Option<TenantId> {
        let username = self.username(principal)?;
        self.store.tenant_id_for(username)
    }

    /// The principal's effective permission set. Empty for unknown users,
    /// unknown tenants and roles with no configured permissions.
    pub fn permissions(&self, principal: &Principal) -> HashSet<PermissionType> {
        let Some(username) = self.username(principal) else {
            return HashSet::new();
        };
        let Some(user) = self.store.user(username) else {
            return HashSet::new();
        };

        let role = if self.directory_authority {
            principal
                .first_authority()
                .map(str::to_string)
                .unwrap_or(user.role)
        } else {
            user.role
        };

        self.store
            .permissions_for_role(user.tenant_id, &role)
            .unwrap_or_default()
    }

    pub fn has_permission(&self, principal: &Principal, permission: PermissionType) -> bool {
        self.permissions(principal).contains(&permission)
    }

    /// True iff the principal holds at least one of the required
    /// permissions. An empty requirement is never satisfied.
    pub fn has_any_permission(&self, principal: &Principal, required: &[PermissionType]) -> bool {
        if required.is_empty() {
            return false;
        }
        let held = self.permissions(principal);
        required.iter().any(|p| held.contains(p))
    }

    /// Environments the principal's team may operate in.
    pub fn allowed_envs(&self, principal: &Principal) -> HashSet<String> {
        let Some(username) = self.username(principal) else {
            return HashSet::new();
        };
        let Some(user) = self.store.user(username) else {
            return HashSet::new();
        };
        self.store.allowed_envs(user.tenant_id, user.team_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use metafleet_cache::InMemorySource;
    use metafleet_core::model::{Team, UserProfile};
    use metafleet_core::permission::RolePermissionRow;

    const TENANT: TenantId = TenantId::new(3);

    async fn evaluator() -> AuthorizationEvaluator<InMemorySource> {
        let source = InMemorySource::new();
        source.put_user(UserProfile {
            username: "alice".to_string(),
            tenant_id: TENANT,
            team_id: 10,
            role: "OPERATOR".to_string(),
            encrypted_password: None,
            switch_teams: false,
        });
        source.put_team(Team {
            tenant_id: TENANT,
            team_id: 10,
            name: "platform".to_string(),
            allowed_env_ids: vec!["dev".to_string(), "prod".to_string()],
        });
        source.put_role_permission(
            TENANT,
            RolePermissionRow {
                role: "OPERATOR".to_string(),
                permission: PermissionType::ApproveTopics,
            },
        );
        source.put_role_permission(
            TENANT,
            RolePermissionRow {
                role: "AUDITOR".to_string(),
                permission: PermissionType::ViewTopics,
            },
        );
        let store = Arc::new(TenantCacheStore::new(source));
        store.reload_users_all_tenants().await.unwrap();
        store.reload_teams_and_envs(TENANT).await.unwrap();
        store.reload_role_permissions(TENANT).await.unwrap();
        AuthorizationEvaluator::new(store)
    }

    #[tokio::test]
    async fn cached_role_grants_its_permissions() {
        let evaluator = evaluator().await;
        let principal = Principal::Username("alice".to_string());

        assert!(evaluator.has_permission(&principal, PermissionType::ApproveTopics));
        assert!(!evaluator.has_permission(&principal, PermissionType::ShutdownSystem));
        assert_eq!(evaluator.tenant_of(&principal), Some(TENANT));
    }

    #[tokio::test]
    async fn unknown_principal_has_no_permissions() {
        let evaluator = evaluator().await;
        let principal = Principal::Username("stranger".to_string());

        assert!(evaluator.permissions(&principal).is_empty());
        assert!(evaluator.allowed_envs(&principal).is_empty());
        assert_eq!(evaluator.tenant_of(&principal), None);
    }

    #[tokio::test]
    async fn anonymous_oidc_principal_is_denied() {
        let evaluator = evaluator().await;
        let principal = Principal::Oidc {
            attributes: std::collections::HashMap::new(),
        };

        assert!(evaluator.permissions(&principal).is_empty());
    }

    #[tokio::test]
    async fn directory_authority_overrides_the_cached_role() {
        let evaluator = evaluator().await.with_directory_authority(true);
        let principal = Principal::Details {
            username: "alice".to_string(),
            authorities: vec!["AUDITOR".to_string()],
        };

        assert!(evaluator.has_permission(&principal, PermissionType::ViewTopics));
        assert!(!evaluator.has_permission(&principal, PermissionType::ApproveTopics));
    }

    #[tokio::test]
    async fn directory_authority_falls_back_to_cached_role() {
        let evaluator = evaluator().await.with_directory_authority(true);
        let principal = Principal::Username("alice".to_string());

        assert!(evaluator.has_permission(&principal, PermissionType::ApproveTopics));
    }

    #[tokio::test]
    async fn any_permission_check_uses_intersection() {
        let evaluator = evaluator().await;
        let principal = Principal::Username("alice".to_string());

        assert!(evaluator.has_any_permission(
            &principal,
            &[PermissionType::ShutdownSystem, PermissionType::ApproveTopics]
        ));
        assert!(!evaluator.has_any_permission(&principal, &[PermissionType::ShutdownSystem]));
        assert!(!evaluator.has_any_permission(&principal, &[]));
    }

    #[tokio::test]
    async fn allowed_envs_come_from_the_team_record() {
        let evaluator = evaluator().await;
        let principal = Principal::Username("alice".to_string());

        let envs = evaluator.allowed_envs(&principal);
        assert_eq!(envs.len(), 2);
        assert!(envs.contains("dev"));
    }

    #[tokio::test]
    async fn role_without_configured_permissions_is_denied() {
        let source = InMemorySource::new();
        source.put_user(UserProfile {
            username: "bob".to_string(),
            tenant_id: TENANT,
            team_id: 1,
            role: "MYSTERY".to_string(),
            encrypted_password: None,
            switch_teams: false,
        });
        let store = Arc::new(TenantCacheStore::new(source));
        store.reload_users_all_tenants().await.unwrap();
        let evaluator = AuthorizationEvaluator::new(store);

        let principal = Principal::Username("bob".to_string());
        assert!(evaluator.permissions(&principal).is_empty());
    }
}
