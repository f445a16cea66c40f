use crate::config::WeatherApiSettings;
use isahc::{AsyncReadResponseExt, HttpClient};
use thiserror::Error;

pub(crate) use self::data::WeatherRecord;

mod data;

const CURRENT_WEATHER_PATH: &str = "/data/2.5/weather";

#[derive(Debug, Error)]
pub(crate) enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] isahc::Error),
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("request failed with status: {0}")]
    RequestFailed(u16),
}

/// Current-weather client for OpenWeatherMap.
pub(crate) struct WeatherClient<'a> {
    http_client: HttpClient,
    base_url: String,
    settings: &'a WeatherApiSettings,
}

impl<'a> WeatherClient<'a> {
    pub fn new(settings: &'a WeatherApiSettings) -> Result<Self, isahc::Error> {
        Ok(Self {
            http_client: HttpClient::new()?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            settings,
        })
    }

    fn request_uri(&self, location: &str) -> String {
        format!(
            "{}{}?q={}&appid={}&units={}",
            self.base_url,
            CURRENT_WEATHER_PATH,
            urlencoding::encode(location),
            urlencoding::encode(&self.settings.appid),
            urlencoding::encode(&self.settings.units),
        )
    }

    pub async fn fetch(&self, location: &str) -> Result<WeatherRecord, FetchError> {
        let mut response = self
            .http_client
            .get_async(self.request_uri(location))
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::RequestFailed(status.as_u16()));
        }

        let record: WeatherRecord = response.json().await?;
        Ok(record)
    }
}
