use anyhow::Result;
use clap::{ArgAction, Parser};
use skyreport_core::{
    Config, ForecastMode, RenderOptions, TemperatureUnit, TimeZoneChoice, WeatherClient,
    WeatherRequest, render,
};
use std::path::PathBuf;
use tracing::debug;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skyreport", version, about = "Weather report CLI")]
pub struct Cli {
    /// Forecast mode: current, per3h, nextday or week.
    #[arg(long, default_value_t = ForecastMode::Current)]
    pub mode: ForecastMode,

    /// Colorized output; `--color false` disables it. Defaults to the config value.
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub color: Option<bool>,

    /// Location query, e.g. "Reykjavik,IS". Defaults to the config value.
    #[arg(long)]
    pub location: Option<String>,

    /// Print timestamps in UTC instead of local time.
    #[arg(long)]
    pub utc: bool,

    /// Print temperatures in Fahrenheit.
    #[arg(long)]
    pub fahrenheit: bool,

    /// Read configuration from this file instead of the platform default.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        let (request, options) = self.resolve(&config);
        debug!(?request, ?options, "resolved invocation");

        let client = WeatherClient::from_config(&config)?;
        let report = client.report(&request).await?;

        print!("{}", render(&report, &options));

        Ok(())
    }

    /// Merge flags over config values.
    fn resolve(&self, config: &Config) -> (WeatherRequest, RenderOptions) {
        let request = WeatherRequest {
            location: self
                .location
                .clone()
                .unwrap_or_else(|| config.default_location.clone()),
            mode: self.mode,
        };

        let options = RenderOptions {
            color: self.color.unwrap_or(config.color),
            zone: if self.utc {
                TimeZoneChoice::Utc
            } else {
                TimeZoneChoice::Local
            },
            unit: if self.fahrenheit {
                TemperatureUnit::Fahrenheit
            } else {
                TemperatureUnit::Celsius
            },
        };

        (request, options)
    }
}
