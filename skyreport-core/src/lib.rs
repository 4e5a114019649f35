//! Core library for the `skyreport` CLI.
//!
//! This crate defines:
//! - Decoding of OpenWeatherMap responses into a small report model
//! - Rendering of reports as text
//! - The HTTP fetch seam and the client that ties fetch and decode together
//! - Configuration handling
//!
//! It is used by `skyreport-cli`, but the decoder and renderer are pure and
//! can be reused on their own.

pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod fetch;
pub mod model;
pub mod render;
pub mod units;

pub use client::{WeatherClient, request_url};
pub use config::Config;
pub use decode::decode;
pub use error::{DecodeError, Error};
pub use fetch::{Fetcher, HttpFetcher, RawResponse};
pub use model::{ForecastMode, WeatherReport, WeatherRequest, WeatherSample};
pub use render::{RenderOptions, TimeZoneChoice, render};
pub use units::TemperatureUnit;
