use packdeploy::config::Config;
use packdeploy::core::{CredentialStore, PackMgrError, PackMgrResult};
use std::io::{self, Write};

/// Store (or delete) the package manager password in the OS keychain
pub fn run(config: &Config, delete: bool) -> PackMgrResult<()> {
    let user_id = &config.package_manager.user_id;

    if delete {
        CredentialStore::delete(user_id)?;
        println!("✓ Removed stored password for '{}'", user_id);
        return Ok(());
    }

    print!("Password for '{}': ", user_id);
    io::stdout().flush()?;
    let mut password = String::new();
    io::stdin().read_line(&mut password)?;
    let password = password.trim_end_matches(['\r', '\n']);

    if password.is_empty() {
        return Err(PackMgrError::Credential("Password cannot be empty".to_string()));
    }

    CredentialStore::store(user_id, password)?;
    println!();
    println!("✓ Password stored securely");
    Ok(())
}
