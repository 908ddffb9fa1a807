//! The helm command surface used during provisioning

use std::path::PathBuf;

use helmboot_repo::{Repository, ResolvedCredentials};

use crate::error::{ProvisionError, Result};
use crate::runner::{CommandLine, CommandOutput, CommandRunner};

/// A provisioned helm binary bound to a command runner
pub struct HelmClient<'a> {
    binary: PathBuf,
    home: Option<PathBuf>,
    runner: &'a dyn CommandRunner,
}

impl<'a> HelmClient<'a> {
    pub fn new(binary: impl Into<PathBuf>, runner: &'a dyn CommandRunner) -> Self {
        Self {
            binary: binary.into(),
            home: None,
            runner,
        }
    }

    /// Pass `--home=<dir>` to init and repo add
    #[must_use]
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    /// `helm init --client-only [--skip-refresh] [--home=<dir>]`
    pub fn init_command(&self, skip_refresh: bool) -> CommandLine {
        let mut command = CommandLine::new(&self.binary).arg("init").arg("--client-only");
        if skip_refresh {
            command = command.arg("--skip-refresh");
        }
        self.with_home_flag(command)
    }

    /// `helm repo add <name> <url> [--home=<dir>] [--username=<u> --password=<p>]`
    pub fn repo_add_command(
        &self,
        repo: &Repository,
        credentials: Option<&ResolvedCredentials>,
    ) -> CommandLine {
        let command = CommandLine::new(&self.binary)
            .arg("repo")
            .arg("add")
            .arg(&repo.name)
            .arg(&repo.url);
        let mut command = self.with_home_flag(command);
        if let Some(credentials) = credentials {
            command = command
                .arg(format!("--username={}", credentials.username))
                .arg(format!("--password={}", credentials.password));
        }
        command
    }

    /// `helm version --client`
    pub fn version_command(&self) -> CommandLine {
        CommandLine::new(&self.binary).arg("version").arg("--client")
    }

    /// Put helm into client-only mode
    pub fn init(&self, skip_refresh: bool) -> Result<()> {
        tracing::info!("Initializing helm client");
        let output = self.run(&self.init_command(skip_refresh), "initialize the helm client")?;
        if !output.is_success() {
            return Err(ProvisionError::InitFailed {
                status: output.status(),
                stderr: output.stderr,
            });
        }
        Ok(())
    }

    /// Register one chart repository
    pub fn add_repository(
        &self,
        repo: &Repository,
        credentials: Option<&ResolvedCredentials>,
    ) -> Result<()> {
        tracing::info!("Adding repository {} at {}", repo.name, repo.url);
        let action = format!("add repository {}", repo.name);
        let output = self.run(&self.repo_add_command(repo, credentials), &action)?;
        if !output.is_success() {
            return Err(ProvisionError::RepoAddFailed {
                name: repo.name.clone(),
                status: output.status(),
                stderr: output.stderr,
            });
        }
        Ok(())
    }

    /// Check that the binary runs at all
    pub fn verify(&self) -> Result<String> {
        tracing::info!("Verifying helm binary {}", self.binary.display());
        let output = self.run(&self.version_command(), "verify the helm binary")?;
        if !output.is_success() {
            return Err(ProvisionError::VerifyFailed {
                path: self.binary.clone(),
                status: output.status(),
                stderr: output.stderr,
            });
        }
        Ok(output.stdout.trim().to_string())
    }

    fn with_home_flag(&self, command: CommandLine) -> CommandLine {
        match &self.home {
            Some(home) => command.arg(format!("--home={}", home.display())),
            None => command,
        }
    }

    fn run(&self, command: &CommandLine, action: &str) -> Result<CommandOutput> {
        self.runner.run(command).map_err(|source| ProvisionError::Spawn {
            program: self.binary.clone(),
            action: action.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingRunner;

    fn credentials() -> ResolvedCredentials {
        ResolvedCredentials {
            username: "alice".to_string(),
            password: "pw".to_string(),
        }
    }

    #[test]
    fn test_init_command() {
        let runner = RecordingRunner::default();
        let client = HelmClient::new("/tools/helm", &runner);
        assert_eq!(client.init_command(false).args(), ["init", "--client-only"]);

        let client = client.with_home(Some(PathBuf::from("/work/.helm")));
        assert_eq!(
            client.init_command(true).args(),
            ["init", "--client-only", "--skip-refresh", "--home=/work/.helm"]
        );
    }

    #[test]
    fn test_repo_add_command() {
        let runner = RecordingRunner::default();
        let client = HelmClient::new("/tools/helm", &runner)
            .with_home(Some(PathBuf::from("/work/.helm")));
        let repo = Repository::new("private", "https://charts.example.com/private").unwrap();

        assert_eq!(
            client.repo_add_command(&repo, None).args(),
            [
                "repo",
                "add",
                "private",
                "https://charts.example.com/private",
                "--home=/work/.helm"
            ]
        );
        assert_eq!(
            client.repo_add_command(&repo, Some(&credentials())).args(),
            [
                "repo",
                "add",
                "private",
                "https://charts.example.com/private",
                "--home=/work/.helm",
                "--username=alice",
                "--password=pw"
            ]
        );
    }

    #[test]
    fn test_init_failure_is_fatal() {
        let runner = RecordingRunner::failing_on("init");
        let client = HelmClient::new("/tools/helm", &runner);
        let err = client.init(false).unwrap_err();
        assert!(matches!(err, ProvisionError::InitFailed { .. }));
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn test_repo_add_failure_names_repository() {
        let runner = RecordingRunner::failing_on("private");
        let client = HelmClient::new("/tools/helm", &runner);
        let repo = Repository::new("private", "https://charts.example.com/private").unwrap();
        let err = client.add_repository(&repo, None).unwrap_err();
        assert!(err.to_string().contains("private"));
    }

    #[test]
    fn test_verify() {
        let runner = RecordingRunner::default();
        let client = HelmClient::new("/usr/local/bin/helm", &runner);
        client.verify().unwrap();
        assert_eq!(runner.calls()[0].args(), ["version", "--client"]);

        let runner = RecordingRunner::failing_on("version");
        let client = HelmClient::new("/usr/local/bin/helm", &runner);
        let err = client.verify().unwrap_err();
        assert!(err.to_string().contains("/usr/local/bin/helm"));
    }
}
