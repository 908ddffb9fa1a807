//! Init command - the full provisioning flow

use console::style;
use helmboot_client::{BinaryOrigin, ProvisionOutcome, Provisioner, SystemRunner};
use helmboot_repo::CredentialStore;
use std::path::Path;

use super::{ProvisionArgs, load_settings};
use crate::error::Result;

pub fn run(config: &Path, credentials_file: Option<&Path>, args: ProvisionArgs) -> Result<()> {
    let settings = load_settings(config, args)?;
    let store = match credentials_file {
        Some(path) => CredentialStore::load_or_default(path)?,
        None => CredentialStore::load()?,
    };

    let outcome = Provisioner::new(&settings, &store, &SystemRunner).run()?;

    match outcome {
        ProvisionOutcome::Skipped => {
            println!("{} helm initialization skipped", style("-").dim());
        }
        ProvisionOutcome::Ready {
            binary,
            repositories,
        } => {
            let how = match &binary.origin {
                BinaryOrigin::Existing => "already installed".to_string(),
                BinaryOrigin::Installed { location, .. } => format!("installed from {}", location),
                BinaryOrigin::Local => "local binary".to_string(),
            };
            println!(
                "{} helm {} ({})",
                style("✓").green().bold(),
                style(binary.path.display()).cyan(),
                how
            );
            for name in &repositories {
                println!("  {} repository {}", style("+").green(), name);
            }
        }
    }

    Ok(())
}
