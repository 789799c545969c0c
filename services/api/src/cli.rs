use crate::commands::{run_apply, run_plan, run_research, ApplyArgs, PlanArgs, ResearchArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use job_apply::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Job Application API",
    about = "Fill and submit employer job applications through a browser agent",
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
    /// Run one application against an employer portal
    Apply(ApplyArgs),
    /// Print the fill plan and agent instructions without contacting an agent
    Plan(PlanArgs),
    /// Ask the agent for a short company profile and recommendation
    Research(ResearchArgs),
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
        Command::Apply(args) => run_apply(args).await,
        Command::Plan(args) => run_plan(args).await,
        Command::Research(args) => run_research(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_line_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["job-apply-api"]).expect("parses");
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["job-apply-api", "serve", "--port", "9000"]).expect("parses");
        match cli.command {
            Some(Command::Serve(args)) => assert_eq!(args.port, Some(9000)),
            other => panic!("expected serve, got {other:?}"),
        }
    }

    #[test]
    fn plan_requires_profile_and_resume() {
        assert!(Cli::try_parse_from(["job-apply-api", "plan"]).is_err());

        let cli = Cli::try_parse_from([
            "job-apply-api",
            "plan",
            "--profile",
            "mock/test_data.json",
            "--resume",
            "mock/test_CV.pdf",
            "--today",
            "2026-10-16",
        ])
        .expect("parses");
        match cli.command {
            Some(Command::Plan(args)) => {
                assert_eq!(args.employer, "rochester-regional-health");
                assert!(args.today.is_some());
            }
            other => panic!("expected plan, got {other:?}"),
        }
    }
}
