//! End-to-end provisioning
//!
//! Locate or download helm, make it executable, initialize the client and
//! register the configured repositories. Any failure aborts the whole run.

use std::path::PathBuf;

use helmboot_core::{
    CoreError, Located, PermissionElevator, Platform, TargetDescriptor, ensure_dir,
    install_from_reader, locate,
};
use helmboot_repo::{ArchiveSource, CredentialStore, Settings, source_for, transfer_failure};

use crate::client::HelmClient;
use crate::error::{ProvisionError, Result};
use crate::runner::CommandRunner;

/// How the helm binary was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryOrigin {
    /// Already present in the install directory
    Existing,
    /// Extracted from a downloaded or local archive
    Installed { location: String, entry: String },
    /// A helm already on this machine
    Local,
}

/// A helm binary ready to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedBinary {
    pub path: PathBuf,
    pub origin: BinaryOrigin,
}

/// Result of a full provisioning run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// `skip` or `skipInit` was set
    Skipped,
    Ready {
        binary: ProvisionedBinary,
        /// Repositories registered, in order
        repositories: Vec<String>,
    },
}

/// Runs the provisioning flow for one settings file
pub struct Provisioner<'a> {
    settings: &'a Settings,
    credentials: &'a CredentialStore,
    runner: &'a dyn CommandRunner,
    platform: Platform,
    source: Option<Box<dyn ArchiveSource + 'a>>,
}

impl<'a> Provisioner<'a> {
    pub fn new(
        settings: &'a Settings,
        credentials: &'a CredentialStore,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        Self {
            settings,
            credentials,
            runner,
            platform: Platform::current(),
            source: None,
        }
    }

    /// Provision for a platform other than the host
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Download from `source` instead of the configured URL
    #[must_use]
    pub fn with_source(mut self, source: Box<dyn ArchiveSource + 'a>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn target(&self) -> TargetDescriptor {
        TargetDescriptor::helm(&self.platform)
    }

    /// Run the whole flow
    pub fn run(&self) -> Result<ProvisionOutcome> {
        if self.settings.is_skipped() {
            tracing::info!("Helm initialization skipped");
            return Ok(ProvisionOutcome::Skipped);
        }

        ensure_dir(&self.settings.output_dir)?;

        let binary = if self.settings.use_local_binary {
            self.local_binary()?
        } else {
            self.install()?
        };

        let client = HelmClient::new(&binary.path, self.runner)
            .with_home(self.settings.home_dir.clone());
        client.init(self.settings.skip_refresh)?;

        let mut repositories = Vec::with_capacity(self.settings.repositories.len());
        for repo in &self.settings.repositories {
            let credentials = self.credentials.resolve_for(repo)?;
            client.add_repository(repo, credentials.as_ref())?;
            repositories.push(repo.name.clone());
        }

        Ok(ProvisionOutcome::Ready {
            binary,
            repositories,
        })
    }

    /// Reuse or install helm into the install directory
    pub fn install(&self) -> Result<ProvisionedBinary> {
        let target = self.target();
        let install_dir = &self.settings.install_dir;

        let path = match locate(install_dir, &target) {
            Located::Present(path) => {
                tracing::info!("Found helm executable at {}", path.display());
                return Ok(ProvisionedBinary {
                    path,
                    origin: BinaryOrigin::Existing,
                });
            }
            Located::Absent(path) => path,
        };
        tracing::debug!("No helm executable at {}", path.display());

        let configured;
        let source: &dyn ArchiveSource = match &self.source {
            Some(source) => &**source,
            None => {
                configured = source_for(&self.settings.download_url_for(&self.platform))?;
                &*configured
            }
        };
        let location = source.location();

        let elevator = PermissionElevator::for_platform(&self.platform);
        let installed = {
            let stream = source.open()?;
            install_from_reader(stream, &target, install_dir, &elevator).map_err(|e| {
                // A dropped connection is a download failure, not an archive one
                if let CoreError::Io(io) = &e
                    && let Some(failure) = transfer_failure(io)
                {
                    return ProvisionError::Repo(failure);
                }
                ProvisionError::Install {
                    location: location.clone(),
                    source: e,
                }
            })?
        };

        Ok(ProvisionedBinary {
            path: installed.path,
            origin: BinaryOrigin::Installed {
                location,
                entry: installed.source.entry,
            },
        })
    }

    /// Find and verify a helm already on this machine
    pub fn local_binary(&self) -> Result<ProvisionedBinary> {
        let path = match &self.settings.local_binary {
            Some(path) => path.clone(),
            None => {
                let name = self.target().file_name().to_string();
                which::which(&name).map_err(|_| ProvisionError::LocalBinaryNotFound { name })?
            }
        };
        tracing::info!("Using local helm executable {}", path.display());

        let version = HelmClient::new(&path, self.runner).verify()?;
        if !version.is_empty() {
            tracing::info!("{}", version);
        }

        Ok(ProvisionedBinary {
            path,
            origin: BinaryOrigin::Local,
        })
    }
}
