//! Where tests run from: the local machine's identity and the ssh usernames
//! for every source host.

pub mod locality;
pub mod registry;

pub use self::locality::LocalIdentity;
pub use self::registry::{HostEntry, HostRegistry, LookupError, RegistryError};
