use crate::core::{PackMgrError, PackMgrResult};
use keyring::Entry;

/// Service name for keyring entries
const KEYRING_SERVICE: &str = "packdeploy";

/// Manages package manager passwords in the OS keychain
///
/// Platform support:
/// - macOS: Keychain
/// - Windows: Credential Manager
/// - Linux: Secret Service (libsecret)
pub struct CredentialStore;

impl CredentialStore {
    /// Store the password for a user id
    pub fn store(user_id: &str, password: &str) -> PackMgrResult<()> {
        let entry = Entry::new(KEYRING_SERVICE, user_id)
            .map_err(|e| PackMgrError::Credential(format!("Failed to create keyring entry: {}", e)))?;

        entry.set_password(password).map_err(|e| {
            PackMgrError::Credential(format!("Failed to store credential in keychain: {}", e))
        })
    }

    /// Retrieve the password for a user id
    pub fn retrieve(user_id: &str) -> PackMgrResult<String> {
        let entry = Entry::new(KEYRING_SERVICE, user_id)
            .map_err(|e| PackMgrError::Credential(format!("Failed to create keyring entry: {}", e)))?;

        entry.get_password().map_err(|e| {
            PackMgrError::Credential(format!(
                "Failed to retrieve credential for '{}' from keychain: {}",
                user_id, e
            ))
        })
    }

    /// Delete the password for a user id
    pub fn delete(user_id: &str) -> PackMgrResult<()> {
        let entry = Entry::new(KEYRING_SERVICE, user_id)
            .map_err(|e| PackMgrError::Credential(format!("Failed to create keyring entry: {}", e)))?;

        entry.delete_credential().map_err(|e| {
            PackMgrError::Credential(format!("Failed to delete credential from keychain: {}", e))
        })
    }
}
