use reqwest::Url;
use tracing::debug;

use crate::{
    Config,
    decode::decode,
    error::Error,
    fetch::{Fetcher, HttpFetcher, truncate_body},
    model::{WeatherReport, WeatherRequest},
};

/// Build the endpoint URL for a request.
///
/// `base` must end with a slash; see [`Config::base_url`].
pub fn request_url(
    base: &Url,
    request: &WeatherRequest,
    api_key: Option<&str>,
) -> Result<Url, Error> {
    let mut url = base
        .join(request.mode.endpoint())
        .map_err(|e| Error::InvalidUrl(format!("{base}: {e}")))?;

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("q", &request.location);
        if let Some(count) = request.mode.period_count() {
            query.append_pair("cnt", &count.to_string());
        }
        if let Some(key) = api_key {
            query.append_pair("appid", key);
        }
    }

    Ok(url)
}

/// Fetches and decodes one report per call.
#[derive(Debug)]
pub struct WeatherClient<F = HttpFetcher> {
    fetcher: F,
    base_url: Url,
    api_key: Option<String>,
}

impl WeatherClient<HttpFetcher> {
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let fetcher = HttpFetcher::new(config.timeout())?;
        Ok(Self::new(fetcher, config.base_url()?, config.api_key()))
    }
}

impl<F: Fetcher> WeatherClient<F> {
    pub fn new(fetcher: F, base_url: Url, api_key: Option<String>) -> Self {
        Self {
            fetcher,
            base_url,
            api_key,
        }
    }

    pub async fn report(&self, request: &WeatherRequest) -> Result<WeatherReport, Error> {
        let url = request_url(&self.base_url, request, self.api_key.as_deref())?;
        debug!(mode = %request.mode, location = %request.location, "requesting weather report");

        let response = self.fetcher.fetch(&url).await?;
        let decoded = decode(&response.body);

        if response.is_success() {
            return decoded;
        }

        // Error statuses usually come with a `cod`/`message` document; prefer
        // that over the bare HTTP status.
        match decoded {
            Err(Error::Api(message)) => Err(Error::Api(message)),
            _ => Err(Error::Transport(format!(
                "weather API request failed with status {}: {}",
                response.status,
                truncate_body(&response.body),
            ))),
        }
    }
}
