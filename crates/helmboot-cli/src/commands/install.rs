//! Install command - provision the binary without initializing it

use helmboot_client::{Provisioner, SystemRunner};
use helmboot_repo::CredentialStore;
use std::path::Path;

use super::{ProvisionArgs, load_settings};
use crate::error::Result;

pub fn run(config: &Path, args: ProvisionArgs) -> Result<()> {
    let settings = load_settings(config, args)?;
    let store = CredentialStore::default();
    let provisioner = Provisioner::new(&settings, &store, &SystemRunner);

    let binary = if settings.use_local_binary {
        provisioner.local_binary()?
    } else {
        provisioner.install()?
    };

    println!("{}", binary.path.display());
    Ok(())
}
