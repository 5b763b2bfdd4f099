//! gv-storage: the storage service, seen from the client
//!
//! The service is an opaque create/fetch API that only ever handles
//! ciphertext. It is expected to burn a secret on its first successful
//! fetch; later fetches for the same uuid come back as `NotFound`.

pub mod http;
pub mod memory;
pub mod store;

pub use http::{build_from_core_config, HttpSecretStore, HttpStoreConfig};
pub use memory::MemorySecretStore;
pub use store::{SecretStore, StoreError};
