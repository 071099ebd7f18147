pub mod credentials;
pub mod error;
pub mod path;

pub use credentials::CredentialStore;
pub use error::{PackMgrError, PackMgrResult};
