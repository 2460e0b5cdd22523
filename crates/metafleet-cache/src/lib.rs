//! Per-tenant in-memory metadata caches, the credential store used for
//! locally managed authentication, and the dispatcher that reconciles both
//! when a metadata change event arrives.

pub mod cipher;
pub mod credentials;
pub mod dispatch;
pub mod memory;
pub mod store;
pub mod traits;

pub use cipher::{CipherError, PasswordCipher};
pub use credentials::{CredentialError, CredentialRecord, CredentialStore};
pub use dispatch::MetadataDispatcher;
pub use memory::InMemorySource;
pub use store::{TenantCacheStore, TenantSnapshot};
pub use traits::{MetadataSource, SourceError};
