use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use foodie_core::{
    BudgetSpec, CityList, Config, RunOutcome, TourDriver, TourError, TourPipeline,
    WeatherFallback, chat::chat_client_from_config, provider::weather_provider_from_config,
};
use tracing::info;

use crate::{interactive, render::ConsoleProgress};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "foodie", version, about = "One-day foodie tours, planned around the weather")]
pub struct Cli {
    /// Log more (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store API keys and defaults in the config file.
    Configure,

    /// Generate a foodie tour for each city.
    Tour {
        /// City to tour; repeat or comma-separate (max 5). Omit to be asked.
        #[arg(short, long = "city", value_name = "CITY", value_delimiter = ',')]
        cities: Vec<String>,

        /// Budget such as "cheap", "mid-range", "fancy" or "$40".
        #[arg(short, long)]
        budget: Option<String>,

        /// What to do when the weather lookup fails: abort or degrade.
        #[arg(long, value_name = "POLICY")]
        weather_fallback: Option<WeatherFallback>,

        /// Print finished tours as JSON on stdout.
        #[arg(long)]
        json: bool,
    },
}

/// Resolved inputs for a tour run.
#[derive(Debug)]
struct TourRequest {
    cities: CityList,
    budget: BudgetSpec,
    fallback: WeatherFallback,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        let result = match self.command {
            Command::Configure => configure().map(|()| ExitCode::SUCCESS),
            Command::Tour { cities, budget, weather_fallback, json } => {
                tour(cities, budget, weather_fallback, json).await
            }
        };

        match result {
            Err(err) if matches!(err.downcast_ref::<TourError>(), Some(TourError::UserCancelled)) => {
                eprintln!("Cancelled.");
                Ok(exit_code(RunOutcome::Cancelled))
            }
            other => other,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;
    interactive::configure(&mut config)?;
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn tour(
    cities: Vec<String>,
    budget: Option<String>,
    fallback: Option<WeatherFallback>,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let config = Config::load_with_env()?;
    let credentials = config.credentials()?;

    let request = resolve_request(&config, cities, budget, fallback)?;
    info!(
        cities = ?request.cities.as_slice(),
        budget = %request.budget,
        fallback = %request.fallback,
        "starting tour run"
    );

    let progress = ConsoleProgress::new(json);
    progress.line(&format!("Planning tours for: {}", request.cities.as_slice().join(", ")));
    progress.line(&format!("Budget: {}", request.budget));

    let pipeline = TourPipeline::connect(
        weather_provider_from_config(&config, &credentials)?,
        chat_client_from_config(&config, &credentials)?,
        request.fallback,
    )
    .await
    .context("Failed to initialize the AI service")?;

    let report = TourDriver::new(pipeline)
        .run(&request.cities, &request.budget, &progress, shutdown_signal())
        .await;

    progress.summary(&report);
    if json {
        println!("{}", serde_json::to_string_pretty(&report.tours)?);
    }

    Ok(exit_code(report.outcome()))
}

/// Cities on the command line mean a scripted run that skips a city when its
/// weather is unavailable. No cities means an interactive run that prompts for
/// input and degrades gracefully instead.
fn resolve_request(
    config: &Config,
    cities: Vec<String>,
    budget: Option<String>,
    fallback: Option<WeatherFallback>,
) -> anyhow::Result<TourRequest> {
    let interactive = cities.is_empty();

    let cities = if interactive { interactive::prompt_cities()? } else { CityList::new(&cities)? };

    let budget = match budget {
        Some(raw) => raw.parse::<BudgetSpec>()?,
        None if interactive => interactive::prompt_budget()?,
        None => BudgetSpec::default(),
    };

    let mode_default = if interactive { WeatherFallback::Degrade } else { WeatherFallback::Abort };
    let fallback = fallback.or(config.weather_fallback).unwrap_or(mode_default);

    Ok(TourRequest { cities, budget, fallback })
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; never cancel.
        std::future::pending::<()>().await;
    }
}

fn exit_status(outcome: RunOutcome) -> u8 {
    match outcome {
        RunOutcome::AllSucceeded => 0,
        RunOutcome::NoneSucceeded => 1,
        RunOutcome::Partial => 2,
        RunOutcome::Cancelled => 130,
    }
}

fn exit_code(outcome: RunOutcome) -> ExitCode {
    ExitCode::from(exit_status(outcome))
}
