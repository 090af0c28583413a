use crate::commands::{run_clean, run_validate, CleanArgs, ValidateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use lutris_web::error::AppError;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "lutris-web",
    about = "Serve the installer API and maintain the installer corpus",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Check and repair installer documents
    Installers {
        #[command(subcommand)]
        command: InstallersCommand,
    },
}

#[derive(Subcommand, Debug)]
enum InstallersCommand {
    /// Validate installer documents; exits non-zero if any is invalid
    Validate(ValidateArgs),
    /// Apply batch fixes to a directory of installer documents
    Clean(CleanArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<ExitCode, AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await.map(|()| ExitCode::SUCCESS),
        Command::Installers {
            command: InstallersCommand::Validate(args),
        } => run_validate(args),
        Command::Installers {
            command: InstallersCommand::Clean(args),
        } => run_clean(args),
    }
}
