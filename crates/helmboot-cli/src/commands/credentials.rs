//! Credential store commands

use console::style;
use helmboot_repo::{CredentialStore, Credentials};
use std::path::{Path, PathBuf};

use crate::error::{CliError, Result};

fn store_path(credentials_file: Option<&Path>) -> Result<PathBuf> {
    match credentials_file {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(CredentialStore::default_path()?),
    }
}

/// Store credentials under `name`
pub fn set(
    credentials_file: Option<&Path>,
    name: &str,
    username: Option<&str>,
    password: Option<&str>,
    username_env: Option<&str>,
    password_env: Option<&str>,
) -> Result<()> {
    let credentials = match (username, password, username_env, password_env) {
        (_, _, Some(user_var), Some(pass_var)) => Credentials::from_env(user_var, pass_var),
        (Some(user), Some(pass), None, None) => Credentials::basic(user, pass),
        _ => {
            return Err(CliError::usage(
                "Provide --username and --password, or --username-env and --password-env",
            ));
        }
    };

    let path = store_path(credentials_file)?;
    let mut store = CredentialStore::load_or_default(&path)?;
    let description = credentials.describe();
    store.set(name, credentials);
    store.save_to(&path)?;

    println!(
        "{} Stored {} credentials for {}",
        style("✓").green().bold(),
        description,
        style(name).cyan()
    );
    Ok(())
}

/// Remove credentials stored under `name`
pub fn remove(credentials_file: Option<&Path>, name: &str) -> Result<()> {
    let path = store_path(credentials_file)?;
    let mut store = CredentialStore::load_or_default(&path)?;

    if store.remove(name).is_none() {
        return Err(CliError::config_with_help(
            format!("No credentials stored for '{}'", name),
            "List stored entries with `helmboot credentials list`",
        ));
    }
    store.save_to(&path)?;

    println!("{} Removed credentials for {}", style("✓").green().bold(), name);
    Ok(())
}

/// List stored entries without secrets
pub fn list(credentials_file: Option<&Path>) -> Result<()> {
    let path = store_path(credentials_file)?;
    let store = CredentialStore::load_or_default(&path)?;

    let mut empty = true;
    for (name, credentials) in store.entries() {
        empty = false;
        println!("{}  {}", style(name).cyan(), credentials.describe());
    }
    if empty {
        println!("{}", style("No credentials stored").dim());
    }
    Ok(())
}
