//! Domain types shared across the metafleet crates: tenant identifiers,
//! metadata change events, cached record shapes, permission tokens and
//! request principals.

pub mod event;
pub mod mode;
pub mod model;
pub mod permission;
pub mod principal;
pub mod tenant;

pub use event::{EntityType, MetadataChangeEvent, OperationType, WireMetadataChange};
pub use mode::{AuthenticationMode, DeploymentMode};
pub use permission::{PermissionType, RolePermissions};
pub use principal::{Principal, PrincipalAttributes};
pub use tenant::TenantId;
