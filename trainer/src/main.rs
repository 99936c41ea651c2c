mod cli;
mod client;
mod env_config;
mod evaluate;
mod launcher;
mod runner;
#[cfg(test)]
mod test_server;

use std::process::ExitCode;
use clap::Parser;
use itertools::Itertools;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use yolo_codebase::assets::WeightVariant;
use yolo_codebase::plan::{BootstrapPlan, StepOrder};
use yolo_codebase::report::RunReport;
use yolo_codebase::GenericResult;
use crate::cli::{AppArgs, Command, RunArgs};
use crate::client::{ExistingPolicy, ReleaseClient};
use crate::env_config::EnvConfig;
use crate::runner::Runner;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn policy(skip_existing: bool) -> ExistingPolicy {
    if skip_existing { ExistingPolicy::Skip } else { ExistingPolicy::Overwrite }
}

fn execute(plan: &BootstrapPlan, policy: ExistingPolicy, dry_run: bool) -> GenericResult<i32> {
    let client = ReleaseClient::new()?;
    let report = Runner::new(&client, policy, dry_run).run(plan);
    summarize(&report);
    Ok(report.exit_code())
}

fn summarize(report: &RunReport) {
    for outcome in &report.outcomes {
        info!("{}", outcome);
    }
    info!("{} steps, {} failed, exit code {}", report.outcomes.len(), report.failures(), report.exit_code());
}

fn dispatch(command: Command, config: &EnvConfig) -> GenericResult<i32> {
    match command {
        Command::Run(args) => {
            let order = if args.fetch_first { StepOrder::FetchFirst } else { StepOrder::AsWritten };
            let plan = BootstrapPlan::new(&config.work_dir, Some(config.job()), config.artifacts(&WeightVariant::ALL), order);
            execute(&plan, policy(args.skip_existing), args.dry_run)
        }
        Command::Fetch(args) => {
            let variants = if args.variants.is_empty() { WeightVariant::ALL.to_vec() } else { args.variants };
            info!("Fetching {}", variants.iter().join(", "));
            let plan = BootstrapPlan::new(&config.work_dir, None, config.artifacts(&variants), StepOrder::AsWritten);
            execute(&plan, policy(args.skip_existing), args.dry_run)
        }
        Command::Launch(args) => {
            let plan = BootstrapPlan::new(&config.work_dir, Some(config.job()), Vec::new(), StepOrder::AsWritten);
            execute(&plan, ExistingPolicy::default(), args.dry_run)
        }
        Command::Evaluate(args) => {
            evaluate::run_evaluation(&args.input, &args.out)?;
            Ok(0)
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let args = AppArgs::parse();
    let config = EnvConfig::new();
    info!("Working in {}", config.work_dir.display());

    let command = args.command.unwrap_or_else(|| Command::Run(RunArgs::default()));
    match dispatch(command, &config) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
