use std::{convert::TryFrom, fmt, str::FromStr};

/// A decoded weather response: the place it describes and one sample per
/// reported period, in the order the API returned them.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub city_name: Option<String>,
    pub country_name: Option<String>,
    pub samples: Vec<WeatherSample>,
}

/// One observation or forecast period.
///
/// Fields missing from the source document keep their zero value; there is
/// no separate "unknown" marker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherSample {
    /// Unix seconds, UTC.
    pub timestamp: i64,
    pub condition: String,
    pub condition_detail: String,
    /// Degrees Celsius.
    pub temperature: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub cloud_cover_percent: u8,
    /// Always an hourly rate, whatever window the source reported.
    pub rain_mm_per_hour: f64,
    pub humidity_percent: u8,
}

/// Which endpoint to query and how many periods to ask for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ForecastMode {
    #[default]
    Current,
    Per3h,
    NextDay,
    Week,
}

impl ForecastMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastMode::Current => "current",
            ForecastMode::Per3h => "per3h",
            ForecastMode::NextDay => "nextday",
            ForecastMode::Week => "week",
        }
    }

    pub const fn all() -> &'static [ForecastMode] {
        &[
            ForecastMode::Current,
            ForecastMode::Per3h,
            ForecastMode::NextDay,
            ForecastMode::Week,
        ]
    }

    /// Endpoint path relative to the API base url.
    pub fn endpoint(&self) -> &'static str {
        match self {
            ForecastMode::Current => "weather",
            ForecastMode::Per3h => "forecast",
            ForecastMode::NextDay | ForecastMode::Week => "forecast/daily",
        }
    }

    /// Number of daily periods requested, for the daily-aggregate endpoint.
    pub fn period_count(&self) -> Option<u8> {
        match self {
            ForecastMode::NextDay => Some(2),
            ForecastMode::Week => Some(7),
            ForecastMode::Current | ForecastMode::Per3h => None,
        }
    }
}

impl fmt::Display for ForecastMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ForecastMode {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "current" => Ok(ForecastMode::Current),
            "per3h" => Ok(ForecastMode::Per3h),
            "nextday" => Ok(ForecastMode::NextDay),
            "week" => Ok(ForecastMode::Week),
            _ => Err(anyhow::anyhow!(
                "Unknown mode '{value}'. Supported modes: current, per3h, nextday, week."
            )),
        }
    }
}

impl FromStr for ForecastMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

/// A single lookup: where, and which kind of report.
#[derive(Debug, Clone)]
pub struct WeatherRequest {
    pub location: String,
    pub mode: ForecastMode,
}
