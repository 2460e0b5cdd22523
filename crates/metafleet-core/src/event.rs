use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::tenant::TenantId;

/// Wire sentinel carried instead of an entity value for bulk operations.
pub const ENTITY_VALUE_ABSENT: &str = "na";

/// Category of metadata a change event concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    Users,
    Team,
    Cluster,
    Environment,
    Tenant,
    RolesPermissions,
    Properties,
    Topics,
}

impl EntityType {
    /// Lenient wire parse. Unknown strings yield `None`; events carrying
    /// them are accepted and dropped rather than rejected.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "USERS" => Some(Self::Users),
            "TEAM" => Some(Self::Team),
            "CLUSTER" => Some(Self::Cluster),
            "ENVIRONMENT" => Some(Self::Environment),
            "TENANT" => Some(Self::Tenant),
            "ROLES_PERMISSIONS" => Some(Self::RolesPermissions),
            "PROPERTIES" => Some(Self::Properties),
            "TOPICS" => Some(Self::Topics),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "USERS",
            Self::Team => "TEAM",
            Self::Cluster => "CLUSTER",
            Self::Environment => "ENVIRONMENT",
            Self::Tenant => "TENANT",
            Self::RolesPermissions => "ROLES_PERMISSIONS",
            Self::Properties => "PROPERTIES",
            Self::Topics => "TOPICS",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    Create,
    Update,
    Delete,
}

impl OperationType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "CREATE" => Some(Self::Create),
            "UPDATE" => Some(Self::Update),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single metadata mutation, produced on the node that performed the
/// change and re-applied on every peer. Immutable once built; broadcast
/// copies are serialized per destination with identical fields.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataChangeEvent {
    pub tenant_id: TenantId,
    pub entity_type: EntityType,
    pub operation_type: OperationType,
    pub entity_value: Option<String>,
    pub created_at: OffsetDateTime,
}

impl MetadataChangeEvent {
    pub fn new(
        tenant_id: TenantId,
        entity_type: EntityType,
        operation_type: OperationType,
        entity_value: Option<String>,
    ) -> Self {
        Self {
            tenant_id,
            entity_type,
            operation_type,
            entity_value,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// Entity value as transmitted to peers, with absent values normalized
    /// to the `"na"` sentinel.
    pub fn wire_entity_value(&self) -> &str {
        self.entity_value.as_deref().unwrap_or(ENTITY_VALUE_ABSENT)
    }
}

/// JSON body of the peer invalidation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMetadataChange {
    pub tenant_id: i32,
    pub entity_type: String,
    pub entity_value: String,
    pub operation_type: String,
}

impl WireMetadataChange {
    pub fn from_event(event: &MetadataChangeEvent) -> Self {
        Self {
            tenant_id: event.tenant_id.value(),
            entity_type: event.entity_type.as_str().to_string(),
            entity_value: event.wire_entity_value().to_string(),
            operation_type: event.operation_type.as_str().to_string(),
        }
    }

    /// Decode back into a domain event. `None` when the entity or operation
    /// string is unknown; such events are acknowledged and ignored.
    pub fn into_event(self) -> Option<MetadataChangeEvent> {
        let entity_type = EntityType::parse(&self.entity_type)?;
        let operation_type = OperationType::parse(&self.operation_type)?;
        let entity_value = match self.entity_value.as_str() {
            "" | ENTITY_VALUE_ABSENT => None,
            _ => Some(self.entity_value),
        };
        Some(MetadataChangeEvent::new(
            TenantId::new(self.tenant_id),
            entity_type,
            operation_type,
            entity_value,
        ))
    }
}
