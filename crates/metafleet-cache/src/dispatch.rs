use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use metafleet_core::event::{EntityType, MetadataChangeEvent, OperationType};
use metafleet_core::mode::AuthenticationMode;

use crate::cipher::PasswordCipher;
use crate::credentials::CredentialStore;
use crate::store::TenantCacheStore;
use crate::traits::{MetadataSource, SourceError};

/// Routes metadata change events to cache reloads, and keeps the local
/// credential store in step with user changes made elsewhere in the fleet.
///
/// Applies are serialized: events touching the same tenant land in arrival
/// order, and a composite reload is never interleaved with another event.
pub struct MetadataDispatcher<S> {
    store: Arc<TenantCacheStore<S>>,
    credentials: Option<CredentialSync>,
    auth_mode: AuthenticationMode,
    apply_lock: Mutex<()>,
}

struct CredentialSync {
    store: Arc<CredentialStore>,
    cipher: PasswordCipher,
}

impl<S: MetadataSource> MetadataDispatcher<S> {
    pub fn new(store: Arc<TenantCacheStore<S>>, auth_mode: AuthenticationMode) -> Self {
        Self {
            store,
            credentials: None,
            auth_mode,
            apply_lock: Mutex::new(()),
        }
    }

    /// Enable credential reconciliation for locally managed authentication.
    pub fn with_credentials(
        mut self,
        credentials: Arc<CredentialStore>,
        cipher: PasswordCipher,
    ) -> Self {
        self.credentials = Some(CredentialSync {
            store: credentials,
            cipher,
        });
        self
    }

    pub fn store(&self) -> &Arc<TenantCacheStore<S>> {
        &self.store
    }

    /// Apply one event to the local caches. `locally_originated` marks
    /// events produced by this node, whose credential side effects already
    /// happened in the request path.
    ///
    /// Unrecognized entity/operation pairs are deliberate no-ops: peers may
    /// run newer builds emitting pairs this node does not act on.
    pub async fn apply(
        &self,
        event: &MetadataChangeEvent,
        locally_originated: bool,
    ) -> Result<(), SourceError> {
        let _guard = self.apply_lock.lock().await;
        let tenant = event.tenant_id;

        match (event.entity_type, event.operation_type) {
            (EntityType::Users, _) => {
                self.store.reload_users_all_tenants().await?;
                if self.auth_mode == AuthenticationMode::Local && !locally_originated {
                    self.reconcile_credentials(event);
                }
            }
            (EntityType::Team, _) => {
                self.store.reload_teams_and_envs(tenant).await?;
            }
            (EntityType::Cluster, OperationType::Delete) => {
                self.store.delete_cluster(tenant);
            }
            (EntityType::Cluster, OperationType::Create) => {
                self.store.reload_clusters(tenant).await?;
            }
            (EntityType::Environment, OperationType::Create) => {
                self.store.reload_environments_full(tenant).await?;
            }
            (EntityType::Environment, OperationType::Delete) => {
                self.store.reload_environments_after_delete(tenant).await?;
            }
            (EntityType::Tenant, OperationType::Create) => {
                self.store.init_tenant_defaults(tenant).await?;
            }
            (EntityType::Tenant, OperationType::Delete) => {
                self.store.delete_tenant(tenant);
            }
            (EntityType::Tenant, OperationType::Update) => {
                self.store.reload_tenant_record(tenant).await?;
            }
            (EntityType::RolesPermissions, _) => {
                self.store.reload_role_permissions(tenant).await?;
            }
            (EntityType::Properties, _) => {
                self.store.reload_properties(tenant).await?;
            }
            (EntityType::Topics, _) => {
                self.store.reload_topics(tenant).await?;
            }
            (entity_type, operation_type) => {
                debug!(%entity_type, %operation_type, "no cache action for event");
            }
        }
        Ok(())
    }

    /// Mirror a remote user change into the credential store. Failures are
    /// logged and swallowed; the metadata cache reload already succeeded and
    /// a bad credential record must not undo it.
    fn reconcile_credentials(&self, event: &MetadataChangeEvent) {
        let Some(sync) = &self.credentials else {
            return;
        };
        let Some(username) = event.entity_value.as_deref() else {
            debug!("user event without a username, skipping credential sync");
            return;
        };

        match event.operation_type {
            OperationType::Create | OperationType::Update => {
                let Some(user) = self.store.user(username) else {
                    warn!(username, "user event for a user absent from the cache");
                    return;
                };
                // Records without a ciphertext carry an empty password.
                let plaintext = match user.encrypted_password.as_deref() {
                    Some(encoded) => match sync.cipher.decrypt(encoded) {
                        Ok(plaintext) => plaintext,
                        Err(err) => {
                            warn!(username, %err, "stored password could not be decrypted");
                            return;
                        }
                    },
                    None => String::new(),
                };
                if let Err(err) = sync.store.install(username, &user.role, &plaintext) {
                    error!(username, %err, "failed to install credential record");
                }
            }
            OperationType::Delete => {
                sync.store.remove(username);
            }
        }
    }
}
