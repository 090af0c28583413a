mod cli;
mod commands;
mod infra;
mod routes;
mod server;

use lutris_web::error::AppError;
use std::process::ExitCode;

pub async fn run() -> Result<ExitCode, AppError> {
    cli::run().await
}
