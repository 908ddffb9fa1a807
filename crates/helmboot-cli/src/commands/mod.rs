//! CLI commands

pub mod credentials;
pub mod detect;
pub mod init;
pub mod install;

use clap::Args;
use helmboot_repo::Settings;
use std::path::{Path, PathBuf};

use crate::error::{CliError, Result};

/// Settings overrides shared by `init` and `install`
#[derive(Args, Debug, Default)]
pub struct ProvisionArgs {
    /// Directory to install helm into
    #[arg(long, env = "HELMBOOT_INSTALL_DIR")]
    pub install_dir: Option<PathBuf>,

    /// Directory created for build output
    #[arg(long, env = "HELMBOOT_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Archive URL or path to install helm from
    #[arg(long, env = "HELMBOOT_DOWNLOAD_URL")]
    pub download_url: Option<String>,

    /// Helm release used for the default download URL
    #[arg(long, env = "HELMBOOT_HELM_VERSION")]
    pub helm_version: Option<String>,

    /// Alternate helm home directory
    #[arg(long, env = "HELMBOOT_HOME")]
    pub home: Option<PathBuf>,

    /// Pass --skip-refresh to helm init
    #[arg(long, env = "HELMBOOT_SKIP_REFRESH")]
    pub skip_refresh: bool,

    /// Skip provisioning entirely
    #[arg(long, env = "HELMBOOT_SKIP")]
    pub skip: bool,

    /// Skip initialization (same as --skip)
    #[arg(long, env = "HELMBOOT_SKIP_INIT")]
    pub skip_init: bool,

    /// Use a helm already installed on this machine
    #[arg(long, env = "HELMBOOT_USE_LOCAL_BINARY")]
    pub use_local_binary: bool,

    /// Local helm executable (implies --use-local-binary)
    #[arg(long, env = "HELMBOOT_LOCAL_BINARY")]
    pub local_binary: Option<PathBuf>,
}

impl ProvisionArgs {
    /// Apply command line values over file settings
    pub fn apply(self, settings: &mut Settings) {
        if let Some(dir) = self.install_dir {
            settings.install_dir = dir;
        }
        if let Some(dir) = self.output_dir {
            settings.output_dir = dir;
        }
        if let Some(url) = self.download_url {
            settings.download_url = Some(url);
        }
        if let Some(version) = self.helm_version {
            settings.helm_version = version;
        }
        if let Some(home) = self.home {
            settings.home_dir = Some(home);
        }
        if let Some(binary) = self.local_binary {
            settings.local_binary = Some(binary);
            settings.use_local_binary = true;
        }
        settings.skip_refresh |= self.skip_refresh;
        settings.skip |= self.skip;
        settings.skip_init |= self.skip_init;
        settings.use_local_binary |= self.use_local_binary;
    }
}

/// Load the settings file and apply overrides
pub fn load_settings(path: &Path, args: ProvisionArgs) -> Result<Settings> {
    let mut settings = Settings::load_or_default(path).map_err(|e| {
        CliError::config_with_help(
            e.to_string(),
            format!("Fix or remove {} to use the defaults", path.display()),
        )
    })?;
    args.apply(&mut settings);
    tracing::debug!("Effective settings: {:?}", settings);
    Ok(settings)
}
