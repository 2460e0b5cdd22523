use metafleet_core::event::MetadataChangeEvent;
use metafleet_core::tenant::TenantId;

pub fn audit_login_success(username: &str, tenant_id: TenantId, role: &str) {
    tracing::info!(
        target: "audit",
        event = "login_success",
        username = username,
        tenant_id = %tenant_id,
        role = role,
        "login succeeded"
    );
}

pub fn audit_login_provisioning(username: &str) {
    tracing::info!(
        target: "audit",
        event = "login_provisioning",
        username = username,
        "login resolved to provisioning"
    );
}

pub fn audit_login_failure(username: &str, reason: &str) {
    tracing::warn!(
        target: "audit",
        event = "login_failure",
        username = username,
        reason = reason,
        "login failed"
    );
}

pub fn audit_cache_reset(change: &MetadataChangeEvent, locally_originated: bool) {
    tracing::info!(
        target: "audit",
        event = "cache_reset",
        tenant_id = %change.tenant_id,
        entity_type = %change.entity_type,
        operation_type = %change.operation_type,
        entity_value = change.wire_entity_value(),
        locally_originated = locally_originated,
        "cache reset applied"
    );
}

pub fn audit_broadcast_failure(peer: &str, error: &str) {
    tracing::warn!(
        target: "audit",
        event = "broadcast_failure",
        peer = peer,
        error = error,
        "peer invalidation failed"
    );
}
