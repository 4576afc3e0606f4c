mod cli;
mod demo;
mod infra;
mod monitor;
mod routes;
mod server;

use visitor_desk::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
