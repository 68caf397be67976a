mod api;
mod cli_messages;
mod config;
mod consts;
mod dashboard;
mod environment;
mod error_classifier;
mod events;
mod export;
mod fetch;
mod filter;
mod logging;
mod network;
mod notifier;
mod series;
mod session;
mod workers;

use crate::config::{Config, DashboardVariant, get_config_path, load_or_default};
use crate::dashboard::Action;
use crate::dashboard::view::NoticeKind;
use crate::environment::Environment;
use crate::export::csv_writer::sanitize_filename;
use crate::series::SeriesMode;
use crate::session::{HeadlessOutcome, run_headless_mode, setup_session};
use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
/// Command-line arguments
struct Args {
    /// Config file to use. Defaults to ~/.metrics-dashboard/config.json
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Backend environment (local, staging, production). Falls back to
    /// METRICS_ENVIRONMENT.
    #[arg(long, global = true, value_name = "ENV")]
    env: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    command: Command,
}

/// Hierarchy filters applied before the command runs.
#[derive(clap::Args, Debug, Clone, Default)]
struct FilterArgs {
    /// VP to filter by
    #[arg(long)]
    vp: Option<String>,

    /// Director under the selected VP
    #[arg(long, requires = "vp")]
    director: Option<String>,

    /// Team under the selected director
    #[arg(long, requires = "director")]
    team: Option<String>,

    /// Show monthly figures instead of yearly ones
    #[arg(long)]
    monthly: bool,
}

impl FilterArgs {
    fn actions(&self) -> Vec<Action> {
        let mut actions = Vec::new();
        if let Some(vp) = &self.vp {
            actions.push(Action::SetVp(vp.clone()));
        }
        if let Some(director) = &self.director {
            actions.push(Action::SetDirector(Some(director.clone())));
        }
        if let Some(team) = &self.team {
            actions.push(Action::SetTeam(Some(team.clone())));
        }
        if self.monthly {
            actions.push(Action::SetMonthly(true));
        }
        actions
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print the metrics grid
    Show {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Print the monthly and cumulative trend of one KPI as JSON
    Graph {
        #[command(flatten)]
        filters: FilterArgs,

        /// KPI whose trend to load
        #[arg(long, default_value = "Commits")]
        kpi: String,

        /// Start on the cumulative chart
        #[arg(long)]
        cumulative: bool,
    },
    /// Export the visible grid rows to CSV
    Export {
        #[command(flatten)]
        filters: FilterArgs,

        /// Directory the CSV file is written to
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Name of the CSV file
        #[arg(long)]
        filename: Option<String>,
    },
    /// Export one KPI through its dedicated export endpoint
    ExportMetric {
        #[command(flatten)]
        filters: FilterArgs,

        /// KPI to export
        #[arg(long)]
        kpi: String,

        /// Directory the CSV file is written to
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },
    /// Write a default config file
    InitConfig {
        /// Which dashboard to drive
        #[arg(long, value_enum, default_value_t = DashboardVariant::EngineeringGrid)]
        variant: DashboardVariant,

        /// Override the environment's API root
        #[arg(long, value_name = "URL")]
        api_root: Option<String>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let environment = resolve_environment(args.env.as_deref())?;
    let config_path = match args.config {
        Some(path) => path,
        None => get_config_path()?,
    };

    match args.command {
        Command::InitConfig {
            variant,
            api_root,
            force,
        } => init_config(&config_path, variant, api_root, force),
        Command::Show { filters } => {
            let config = load_or_default(&config_path)?;
            let outcome = run_session(&config, environment, filters.actions()).await?;
            let view = outcome.view;
            if let Some(error) = &view.error_banner {
                return Err(error.clone().into());
            }
            if let Some(prompt) = &view.prompt {
                print_cmd_warn!("Filters", "{}", prompt);
            }
            cli_messages::print_table(&view.table);
            print_cmd_info!("Last updated", "{}", view.last_updated);
            Ok(())
        }
        Command::Graph {
            filters,
            kpi,
            cumulative,
        } => {
            let config = load_or_default(&config_path)?;
            let mode = if cumulative {
                SeriesMode::Cumulative
            } else {
                SeriesMode::Monthly
            };
            let mut script = filters.actions();
            script.push(Action::OpenGraph { kpi, mode });
            let outcome = run_session(&config, environment, script).await?;
            let graph = outcome
                .view
                .graph
                .ok_or("The graph popup closed before its data arrived")?;
            if let Some(error) = &graph.error {
                return Err(error.clone().into());
            }
            println!("{}", serde_json::to_string_pretty(&graph)?);
            Ok(())
        }
        Command::Export {
            filters,
            output_dir,
            filename,
        } => {
            let mut config = load_or_default(&config_path)?;
            if let Some(dir) = output_dir {
                config.export_dir = dir;
            }
            if let Some(filename) = filename {
                config.grid_export_filename = filename;
            }
            config.validate()?;
            let mut script = filters.actions();
            script.push(Action::ExportGrid);
            let outcome = run_session(&config, environment, script).await?;
            report_export(&outcome, &config.export_dir)
        }
        Command::ExportMetric {
            filters,
            kpi,
            output_dir,
        } => {
            let mut config = load_or_default(&config_path)?;
            if let Some(dir) = output_dir {
                config.export_dir = dir;
            }
            config.validate()?;
            let mut script = filters.actions();
            script.push(Action::ExportMetricRow(kpi));
            let outcome = run_session(&config, environment, script).await?;
            report_export(&outcome, &config.export_dir)
        }
    }
}

/// `--env` wins over `METRICS_ENVIRONMENT`; an unset or unknown variable
/// means the default environment.
fn resolve_environment(flag: Option<&str>) -> Result<Environment, String> {
    match flag {
        Some(value) => value
            .parse::<Environment>()
            .map_err(|_| format!("Unknown environment '{}'", value)),
        None => Ok(std::env::var("METRICS_ENVIRONMENT")
            .unwrap_or_default()
            .parse::<Environment>()
            .unwrap_or_default()),
    }
}

fn init_config(
    config_path: &Path,
    variant: DashboardVariant,
    api_root: Option<String>,
    force: bool,
) -> Result<(), Box<dyn Error>> {
    if config_path.exists() && !force {
        return Err(format!(
            "Config file already exists at {}. Use --force to overwrite it.",
            config_path.display()
        )
        .into());
    }
    let mut config = Config::new(variant);
    config.api_root = api_root;
    config.validate()?;
    config
        .save(config_path)
        .map_err(|e| format!("Failed to save config: {}", e))?;
    print_cmd_success!("Config written", "{}", config_path.display());
    Ok(())
}

async fn run_session(
    config: &Config,
    environment: Environment,
    script: Vec<Action>,
) -> Result<HeadlessOutcome, Box<dyn Error>> {
    let session = setup_session(config, environment)?;
    Ok(run_headless_mode(session, script).await?)
}

/// Turn the final export notice into the command's result.
fn report_export(outcome: &HeadlessOutcome, export_dir: &Path) -> Result<(), Box<dyn Error>> {
    match &outcome.view.notice {
        Some(notice) if notice.kind == NoticeKind::Complete => {
            let path = export_dir.join(sanitize_filename(&notice.detail));
            print_cmd_success!(&notice.message, "{}", path.display());
            Ok(())
        }
        Some(notice) => Err(format!("{}: {}", notice.message, notice.detail).into()),
        None => Err(refusal_reason(outcome).into()),
    }
}

fn refusal_reason(outcome: &HeadlessOutcome) -> String {
    let view = &outcome.view;
    if let Some(error) = &view.error_banner {
        return format!("Export did not run: {}", error);
    }
    if let Some(prompt) = &view.prompt {
        return format!("Export did not run: {}", prompt);
    }
    outcome
        .activity
        .iter()
        .rev()
        .find(|event| event.msg.starts_with("Ignored"))
        .map(|event| format!("Export did not run: {}", event.msg))
        .unwrap_or_else(|| "Export did not run: no rows to export".to_string())
}
