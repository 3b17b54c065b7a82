use clap::{Parser, Subcommand};
use color_eyre::Result;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use squadboard::cache::TtlCache;
use squadboard::config::{Config, Environment};
use squadboard::dashboard::{AggregatorSettings, DashboardAggregator, DashboardError, DashboardSnapshot};
use squadboard::jira::{Board, Credentials, JiraClient, Sprint, DEFAULT_CLOSED_SPRINT_LIMIT};

#[derive(Parser, Debug)]
#[command(name = "squadboard")]
#[command(about = "Squad health dashboard built from Jira boards")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/squadboard/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Restrict to a Jira project key (repeatable, overrides the config)
  #[arg(short, long)]
  project: Vec<String>,

  /// Pretty-print JSON output
  #[arg(long)]
  pretty: bool,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
  /// Print the aggregated dashboard snapshot (default)
  Snapshot,
  /// Print the discovered boards
  Boards,
  /// Print a board's sprints
  Sprints {
    #[arg(long)]
    board: u64,
    /// Only the most recent closed sprints
    #[arg(long)]
    closed: bool,
    #[arg(long, default_value_t = DEFAULT_CLOSED_SPRINT_LIMIT)]
    limit: u64,
  },
  /// Check that Jira is reachable with the configured credentials
  Check,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Output {
  Snapshot(Box<DashboardSnapshot>),
  Boards(Vec<Board>),
  Sprints(Vec<Sprint>),
  Check { status: &'static str, boards: usize },
}

/// Logs go to stderr so stdout carries only JSON.
fn init_tracing() -> WorkerGuard {
  let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("squadboard=info"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_target(false)
    .compact()
    .init();
  guard
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
  color_eyre::install()?;

  let args = Args::parse();
  let _guard = init_tracing();

  let mut config = Config::load(args.config.as_deref())?;
  if !args.project.is_empty() {
    config.project_keys = args.project.clone();
  }

  let token = Config::api_token()?;
  config.validate(&token)?;

  let client = JiraClient::new(
    &config.jira.domain,
    Credentials {
      email: config.jira.email.clone(),
      token,
    },
  )?;

  let command = args.command.clone().unwrap_or(Command::Snapshot);
  match run(command, &config, client).await {
    Ok(output) => {
      let json = if args.pretty {
        serde_json::to_string_pretty(&output)?
      } else {
        serde_json::to_string(&output)?
      };
      println!("{}", json);
      Ok(ExitCode::SUCCESS)
    }
    Err(e) => {
      report_failure(&e, config.environment);
      Ok(ExitCode::FAILURE)
    }
  }
}

async fn run(command: Command, config: &Config, client: JiraClient) -> Result<Output, DashboardError> {
  match command {
    Command::Snapshot => {
      let settings = AggregatorSettings {
        snapshot_ttl: config.cache.ttl(),
        ..AggregatorSettings::default()
      };
      let aggregator = DashboardAggregator::with_settings(client, TtlCache::new(), settings);
      let snapshot = aggregator.dashboard_snapshot(config.project_filter()).await?;
      Ok(Output::Snapshot(Box::new(snapshot)))
    }
    Command::Boards => Ok(Output::Boards(client.list_boards(config.project_filter()).await?)),
    Command::Sprints { board, closed, limit } => {
      let sprints = if closed {
        client.get_closed_sprints(board, limit).await?
      } else {
        client.get_all_sprints(board).await?
      };
      Ok(Output::Sprints(sprints))
    }
    Command::Check => {
      let boards = client.list_boards(config.project_filter()).await?;
      info!(boards = boards.len(), "Jira is reachable");
      Ok(Output::Check {
        status: "ok",
        boards: boards.len(),
      })
    }
  }
}

/// Production output carries only the category message.
fn report_failure(err: &DashboardError, environment: Environment) {
  let category = err.category();
  error!(status = category.http_status(), "{}", err);
  match environment {
    Environment::Production => eprintln!("error ({}): {}", category.http_status(), category.user_message()),
    Environment::Development => eprintln!(
      "error ({}): {}\n  caused by: {}",
      category.http_status(),
      category.user_message(),
      err
    ),
  }
}
