use crate::demo::{run_demo, run_score, run_search, DemoArgs, ScoreArgs, SearchArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use hirechain::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "HireChain",
    about = "Run the HireChain application service or exercise its workflows from the command line",
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
    /// Score how well a candidate's skills cover a job's skills
    Score(ScoreArgs),
    /// Follow an AI job search for a candidate until it finishes
    Search(SearchArgs),
    /// Walk an application from submission to verification against a demo marketplace
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
        Command::Score(args) => run_score(args),
        Command::Search(args) => run_search(args).await,
        Command::Demo(args) => run_demo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["hirechain"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn search_threshold_is_validated() {
        let parsed = Cli::try_parse_from([
            "hirechain",
            "search",
            "--candidate-id",
            "ada@example.com",
            "--threshold",
            "0.8",
        ])
        .expect("parses");
        match parsed.command {
            Some(Command::Search(args)) => assert_eq!(args.threshold, Some(0.8)),
            other => panic!("unexpected command {other:?}"),
        }

        assert!(Cli::try_parse_from([
            "hirechain",
            "search",
            "--candidate-id",
            "ada@example.com",
            "--threshold",
            "2",
        ])
        .is_err());
    }
}
