use chrono::{DateTime, Local, Utc};
use crossterm::style::{Color, Stylize, style};

use crate::{
    model::{WeatherReport, WeatherSample},
    units::TemperatureUnit,
};

const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";
const SEPARATOR: &str = "===";

/// Zone used to print sample timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeZoneChoice {
    /// The system's local zone.
    #[default]
    Local,
    Utc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Emit ANSI colors.
    pub color: bool,
    pub zone: TimeZoneChoice,
    pub unit: TemperatureUnit,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            color: true,
            zone: TimeZoneChoice::Local,
            unit: TemperatureUnit::Celsius,
        }
    }
}

/// Format a report as text, one block per sample, each block terminated by a
/// separator line. Never fails; zero-valued fields print as zero.
pub fn render(report: &WeatherReport, options: &RenderOptions) -> String {
    let header = format!(
        "[{},{}]",
        report.city_name.as_deref().unwrap_or_default(),
        report.country_name.as_deref().unwrap_or_default(),
    );

    let mut lines = vec![paint_bold(&header, Color::Cyan, options.color)];
    for sample in &report.samples {
        lines.extend(render_sample(sample, options));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn render_sample(sample: &WeatherSample, options: &RenderOptions) -> Vec<String> {
    let unit = options.unit;
    let condition = format!("{} ({})", sample.condition, sample.condition_detail);

    vec![
        format!(" datetime: {}", format_timestamp(sample.timestamp, options.zone)),
        format!("  weather: {}", paint(&condition, Color::Yellow, options.color)),
        format!(
            "     temp: {:5.2} (min:{:.2} / max:{:.2})[{}]",
            unit.convert(sample.temperature),
            unit.convert(sample.min_temperature),
            unit.convert(sample.max_temperature),
            unit.symbol(),
        ),
        format!("    cloud: {:5}[%]", sample.cloud_cover_percent),
        format!("     hmdy: {:5}[%]", sample.humidity_percent),
        format!("     rain: {:5.2}[mm/1h]", sample.rain_mm_per_hour),
        paint(SEPARATOR, Color::DarkGrey, options.color),
    ]
}

/// Timestamps chrono cannot represent fall back to the raw seconds.
fn format_timestamp(seconds: i64, zone: TimeZoneChoice) -> String {
    let Some(utc) = DateTime::<Utc>::from_timestamp(seconds, 0) else {
        return seconds.to_string();
    };

    match zone {
        TimeZoneChoice::Utc => utc.format(TIMESTAMP_FORMAT).to_string(),
        TimeZoneChoice::Local => utc
            .with_timezone(&Local)
            .format(TIMESTAMP_FORMAT)
            .to_string(),
    }
}

fn paint(text: &str, color: Color, enabled: bool) -> String {
    if enabled {
        style(text).with(color).to_string()
    } else {
        text.to_owned()
    }
}

fn paint_bold(text: &str, color: Color, enabled: bool) -> String {
    if enabled {
        style(text).with(color).bold().to_string()
    } else {
        text.to_owned()
    }
}
