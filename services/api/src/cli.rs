use crate::demo::{run_demo, run_fees, DemoArgs, FeesArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use probate_desk::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Probate Desk",
    about = "Run the probate desk API or exercise its workflows from the command line",
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
    /// Calculate British Columbia probate court fees for an estate value
    Fees(FeesArgs),
    /// Walk a sample estate through fees, screening, the matter timeline and documents
    Demo(DemoArgs),
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
        Command::Fees(args) => run_fees(args),
        Command::Demo(args) => run_demo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn fees_command_parses_estate_value() {
        let cli = Cli::try_parse_from(["probate-desk-api", "fees", "--estate-value", "750000.50"])
            .expect("arguments parse");
        match cli.command {
            Some(Command::Fees(args)) => {
                assert_eq!(args.estate_value, "750000.50".parse::<Decimal>().expect("decimal"));
                assert!(!args.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn demo_rejects_malformed_start_date() {
        let parsed = Cli::try_parse_from(["probate-desk-api", "demo", "--start", "03/01/2024"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn serve_is_the_default() {
        let cli = Cli::try_parse_from(["probate-desk-api"]).expect("arguments parse");
        assert!(cli.command.is_none());
    }
}
