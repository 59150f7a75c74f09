use clap::Parser;

use taskman::cli::{Cli, CliHandler};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(format!("taskman={}", log_level))
        .with_writer(std::io::stderr);
    subscriber.init();

    let mut handler = CliHandler::new(cli.config);

    if let Err(e) = handler.execute(cli.command).await {
        handler.report_error(&e);
        std::process::exit(1);
    }
}
