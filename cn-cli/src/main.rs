use clap::Parser;
use cn_cli::Cli;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = cli.run().await {
        cn_cli::print_error(&e.to_string());
        std::process::exit(1);
    }
}
