use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use skycast_core::{
    CitySearch, Config, Dataset, FailoverResolver, ProviderId, provider::DEFAULT_FORECAST_DAYS,
    search::DEFAULT_SEARCH_LIMIT,
};

use crate::output;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "skycast",
    version,
    about = "Weather with provider failover and offline fallbacks"
)]
pub struct Cli {
    /// Print raw JSON instead of the human-readable summary.
    #[arg(long, global = true)]
    pub json: bool,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openweather" or "weatherapi".
        provider: String,
    },

    /// Show current conditions for a city.
    Current {
        /// City or location name.
        city: String,
    },

    /// Show a multi-day forecast for a city.
    Forecast {
        city: String,

        /// Number of days, clamped to 1..=15.
        #[arg(long, default_value_t = i64::from(DEFAULT_FORECAST_DAYS))]
        days: i64,
    },

    /// Suggest city names matching a query.
    Search {
        query: String,

        #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },

    /// Look a city up in the offline dataset.
    Lookup {
        query: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Current { city } => {
                let (config, dataset) = load_runtime()?;
                let record = FailoverResolver::from_config(&config, dataset)
                    .resolve_current(&city)
                    .await?;

                if self.json {
                    output::print_json(&record)
                } else {
                    output::print_current(&record);
                    Ok(())
                }
            }
            Command::Forecast { city, days } => {
                let (config, dataset) = load_runtime()?;
                let payload = FailoverResolver::from_config(&config, dataset)
                    .resolve_forecast(&city, days)
                    .await?;

                if self.json {
                    output::print_json(&payload)
                } else {
                    output::print_forecast(&payload);
                    Ok(())
                }
            }
            Command::Search { query, limit } => {
                let (config, dataset) = load_runtime()?;
                let outcome = CitySearch::from_config(&config, dataset)
                    .search(&query, limit)
                    .await
                    .context("City search failed")?;

                if self.json {
                    output::print_json(&outcome)
                } else {
                    output::print_search(&outcome);
                    Ok(())
                }
            }
            Command::Lookup { query } => {
                let (config, dataset) = load_runtime()?;
                let index = CitySearch::from_config(&config, dataset).index();

                match index.lookup(&query) {
                    Some(row) if self.json => output::print_json(row),
                    Some(row) => {
                        output::print_row(row);
                        Ok(())
                    }
                    None => bail!("No dataset entry matches '{query}'"),
                }
            }
        }
    }
}

fn load_runtime() -> anyhow::Result<(Config, Arc<Dataset>)> {
    let mut config = Config::load()?;
    config.apply_env_overrides();

    let dataset = Dataset::from_config(&config.data)?;
    Ok((config, Arc::new(dataset)))
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;

    // Env overrides are not applied here so they never end up on disk.
    let mut config = Config::load()?;

    let api_key = Password::new(&format!("API key for {id}:"))
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    config.upsert_provider_api_key(id, api_key.trim().to_string());
    config.save()?;

    println!("Saved API key for {id} to {}", Config::config_file_path()?.display());
    Ok(())
}
