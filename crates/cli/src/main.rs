//! Benchtrack CLI entry point.

use benchtrack_cli::{Cli, Outcome};
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let settings = match cli.settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = benchtrack_core::telemetry::init_tracing(&settings.logging) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    match benchtrack_cli::run(cli, settings).await {
        Ok(Outcome::Success) => {}
        Ok(Outcome::RegressionsFound) => std::process::exit(2),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
