//! helmboot CLI - provision a helm client for build pipelines

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod exit_codes;

use commands::ProvisionArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "helmboot")]
#[command(author = "helmboot Contributors")]
#[command(version)]
#[command(about = "Download, unpack and initialize helm for a build", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Settings file
    #[arg(
        short,
        long,
        global = true,
        env = "HELMBOOT_CONFIG",
        default_value = helmboot_repo::DEFAULT_SETTINGS_FILE
    )]
    config: PathBuf,

    /// Credential store (default: user config directory)
    #[arg(long, global = true, env = "HELMBOOT_CREDENTIALS")]
    credentials_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Install helm, initialize the client and add repositories
    Init {
        #[command(flatten)]
        args: ProvisionArgs,
    },

    /// Install helm only and print its path
    Install {
        #[command(flatten)]
        args: ProvisionArgs,
    },

    /// Show the format and entries of a local archive
    Detect {
        /// Archive file
        archive: PathBuf,
    },

    /// Manage repository credentials
    Credentials {
        #[command(subcommand)]
        action: CredentialsAction,
    },
}

#[derive(Subcommand)]
enum CredentialsAction {
    /// Store credentials for a repository
    Set {
        /// Repository name or credentialRef
        name: String,

        /// Username
        #[arg(short, long, requires = "password", conflicts_with = "username_env")]
        username: Option<String>,

        /// Password
        #[arg(short, long, env = "HELMBOOT_REPO_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Read the username from this environment variable at init time
        #[arg(long, requires = "password_env")]
        username_env: Option<String>,

        /// Read the password from this environment variable at init time
        #[arg(long, requires = "username_env")]
        password_env: Option<String>,
    },

    /// Remove stored credentials
    Remove {
        /// Repository name or credentialRef
        name: String,
    },

    /// List stored credentials without secrets
    List,
}

fn main() {
    miette::set_panic_hook();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version are reported through the same path
            let code = if err.use_stderr() {
                exit_codes::USAGE_ERROR
            } else {
                exit_codes::SUCCESS
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };
    init_tracing(cli.debug);

    if let Err(err) = run(cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "helmboot={level},helmboot_core={level},helmboot_repo={level},helmboot_client={level}"
        ))
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let credentials_file = cli.credentials_file.as_deref();

    match cli.command {
        Commands::Init { args } => commands::init::run(&cli.config, credentials_file, args),

        Commands::Install { args } => commands::install::run(&cli.config, args),

        Commands::Detect { archive } => commands::detect::run(&archive),

        Commands::Credentials { action } => match action {
            CredentialsAction::Set {
                name,
                username,
                password,
                username_env,
                password_env,
            } => commands::credentials::set(
                credentials_file,
                &name,
                username.as_deref(),
                password.as_deref(),
                username_env.as_deref(),
                password_env.as_deref(),
            ),
            CredentialsAction::Remove { name } => {
                commands::credentials::remove(credentials_file, &name)
            }
            CredentialsAction::List => commands::credentials::list(credentials_file),
        },
    }
}
