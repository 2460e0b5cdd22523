use std::collections::{HashMap, HashSet};
use std::fmt;

/// Closed set of permission tokens a role may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionType {
    ViewTopics,
    RequestCreateTopics,
    RequestDeleteTopics,
    ApproveTopics,
    SyncTopics,
    AddUser,
    AddTeams,
    AddEditRoles,
    UpdatePermissions,
    ManageClusters,
    ManageEnvironments,
    ManageTenants,
    UpdateServerConfig,
    ShutdownSystem,
}

impl PermissionType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "VIEW_TOPICS" => Some(Self::ViewTopics),
            "REQUEST_CREATE_TOPICS" => Some(Self::RequestCreateTopics),
            "REQUEST_DELETE_TOPICS" => Some(Self::RequestDeleteTopics),
            "APPROVE_TOPICS" => Some(Self::ApproveTopics),
            "SYNC_TOPICS" => Some(Self::SyncTopics),
            "ADD_USER" => Some(Self::AddUser),
            "ADD_TEAMS" => Some(Self::AddTeams),
            "ADD_EDIT_ROLES" => Some(Self::AddEditRoles),
            "UPDATE_PERMISSIONS" => Some(Self::UpdatePermissions),
            "MANAGE_CLUSTERS" => Some(Self::ManageClusters),
            "MANAGE_ENVIRONMENTS" => Some(Self::ManageEnvironments),
            "MANAGE_TENANTS" => Some(Self::ManageTenants),
            "UPDATE_SERVER_CONFIG" => Some(Self::UpdateServerConfig),
            "SHUTDOWN_SYSTEM" => Some(Self::ShutdownSystem),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewTopics => "VIEW_TOPICS",
            Self::RequestCreateTopics => "REQUEST_CREATE_TOPICS",
            Self::RequestDeleteTopics => "REQUEST_DELETE_TOPICS",
            Self::ApproveTopics => "APPROVE_TOPICS",
            Self::SyncTopics => "SYNC_TOPICS",
            Self::AddUser => "ADD_USER",
            Self::AddTeams => "ADD_TEAMS",
            Self::AddEditRoles => "ADD_EDIT_ROLES",
            Self::UpdatePermissions => "UPDATE_PERMISSIONS",
            Self::ManageClusters => "MANAGE_CLUSTERS",
            Self::ManageEnvironments => "MANAGE_ENVIRONMENTS",
            Self::ManageTenants => "MANAGE_TENANTS",
            Self::UpdateServerConfig => "UPDATE_SERVER_CONFIG",
            Self::ShutdownSystem => "SHUTDOWN_SYSTEM",
        }
    }

    pub fn all() -> impl Iterator<Item = PermissionType> {
        [
            Self::ViewTopics,
            Self::RequestCreateTopics,
            Self::RequestDeleteTopics,
            Self::ApproveTopics,
            Self::SyncTopics,
            Self::AddUser,
            Self::AddTeams,
            Self::AddEditRoles,
            Self::UpdatePermissions,
            Self::ManageClusters,
            Self::ManageEnvironments,
            Self::ManageTenants,
            Self::UpdateServerConfig,
            Self::ShutdownSystem,
        ]
        .into_iter()
    }
}

impl fmt::Display for PermissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role name to permission set, scoped per tenant.
pub type RolePermissions = HashMap<String, HashSet<PermissionType>>;

/// One row as returned by the system of record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePermissionRow {
    pub role: String,
    pub permission: PermissionType,
}

pub fn build_role_permissions(rows: &[RolePermissionRow]) -> RolePermissions {
    let mut map: RolePermissions = HashMap::new();
    for row in rows {
        map.entry(row.role.clone()).or_default().insert(row.permission);
    }
    map
}

/// Static data installed for a freshly created tenant: a superadmin role
/// with every permission and a user role limited to viewing and requesting.
pub fn default_role_permissions() -> RolePermissions {
    let mut map: RolePermissions = HashMap::new();
    map.insert("SUPERADMIN".to_string(), PermissionType::all().collect());
    map.insert(
        "USER".to_string(),
        HashSet::from([
            PermissionType::ViewTopics,
            PermissionType::RequestCreateTopics,
            PermissionType::RequestDeleteTopics,
        ]),
    );
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_parse_round_trips() {
        for permission in PermissionType::all() {
            assert_eq!(PermissionType::parse(permission.as_str()), Some(permission));
        }
    }

    #[test]
    fn unknown_permission_parses_to_none() {
        assert_eq!(PermissionType::parse("FLY_TO_MARS"), None);
        assert_eq!(PermissionType::parse("view_topics"), None);
    }

    #[test]
    fn build_role_permissions_groups_rows_by_role() {
        let rows = vec![
            RolePermissionRow {
                role: "USER".to_string(),
                permission: PermissionType::ViewTopics,
            },
            RolePermissionRow {
                role: "USER".to_string(),
                permission: PermissionType::RequestCreateTopics,
            },
            RolePermissionRow {
                role: "ADMIN".to_string(),
                permission: PermissionType::ApproveTopics,
            },
        ];

        let map = build_role_permissions(&rows);

        assert_eq!(map["USER"].len(), 2);
        assert_eq!(map["ADMIN"].len(), 1);
        assert!(map["ADMIN"].contains(&PermissionType::ApproveTopics));
    }

    #[test]
    fn default_roles_include_full_superadmin() {
        let map = default_role_permissions();

        assert_eq!(map["SUPERADMIN"].len(), PermissionType::all().count());
        assert!(map["USER"].contains(&PermissionType::ViewTopics));
        assert!(!map["USER"].contains(&PermissionType::ShutdownSystem));
    }
}
