use clap::Parser;
use latchpoint::cli::Cli;
use tracing::error;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(e) = cli.dispatch().await {
        error!(error = %e, "fatal error");
        eprintln!("error: {e:?}");
        std::process::exit(1);
    }
}
