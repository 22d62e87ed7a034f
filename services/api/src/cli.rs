use crate::commands::{run_history, run_seed, run_send, HistoryArgs, SendArgs};
use crate::server;
use auto_apply::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "auto-apply",
    about = "Track target companies and email your resume to their HR contacts",
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
    /// Insert the demo companies, skipping names that already exist
    Seed,
    /// Email the stored resume to one company and record the attempt
    Send(SendArgs),
    /// Print the application log, most recent first
    History(HistoryArgs),
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

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Seed => run_seed(),
        Command::Send(args) => tokio::task::spawn_blocking(move || run_send(args))
            .await
            .map_err(|err| AppError::Io(std::io::Error::other(err)))?,
        Command::History(args) => run_history(args),
    }
}
