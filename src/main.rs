use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use aimastering::api::MasteringClient;
use aimastering::api::client::build_http_client;
use aimastering::cli::{Cli, Command, MasterArgs, write_completions};
use aimastering::config::AppConfig;
use aimastering::error::MasteringError;
use aimastering::orchestrator::MasteringOrchestrator;
use aimastering::ui::MasteringProgress;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let progress = MasteringProgress::new();
    let result = match &cli.command {
        Command::Master(args) => master(args, cli.config.as_deref(), &progress).await,
        Command::Completions { shell } => {
            write_completions(*shell, &mut std::io::stdout());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            progress.failure(&err);
            ExitCode::from(err.exit_code())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "aimastering=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn master(
    args: &MasterArgs,
    config_path: Option<&Path>,
    progress: &MasteringProgress,
) -> Result<(), MasteringError> {
    let config = AppConfig::load(config_path).map_err(|e| MasteringError::Config(format!("{e:#}")))?;
    let access_token = config.access_token(args.access_token.as_deref())?;
    let plan = args.plan();
    plan.validate()?;

    let user_agent = args.user_agent.as_deref().unwrap_or(&config.user_agent);
    let base_url = args.api_base_url.as_deref().unwrap_or(&config.api_base_url);
    tracing::debug!("user agent {user_agent}, api {base_url}");

    let http = build_http_client(user_agent)
        .map_err(|e| MasteringError::Config(format!("failed to build HTTP client: {e}")))?;
    let client = MasteringClient::with_base_url(access_token, http.clone(), base_url.to_string());
    let orchestrator = MasteringOrchestrator::new(client, http, config.poll_policy());

    let report = orchestrator.run(&plan, progress).await?;
    progress.success(&report);
    if args.report {
        progress.print_report(&report);
    }
    Ok(())
}
