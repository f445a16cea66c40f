use serde::Deserialize;
use std::{path::Path, time::Duration};
use thiserror::Error;

const DEFAULT_UNITS: &str = "standard";
const OPENWEATHERMAP_URL: &str = "https://api.openweathermap.org";

/// Settings document read once at startup.
///
/// The value is never mutated after [`Settings::from_file`] returns; every
/// component borrows the part it needs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct Settings {
    pub sensor: SensorSettings,
    pub weather_api: WeatherApiSettings,
    pub influxdb: InfluxSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct SensorSettings {
    /// Seconds between two polling passes.
    pub interval: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct WeatherApiSettings {
    pub appid: String,
    #[serde(default = "default_units")]
    pub units: String,
    #[serde(default)]
    pub locations: Vec<String>,
    /// Single-location form, folded into `locations` on load.
    #[serde(default)]
    pub api_location: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct InfluxSettings {
    pub hostname: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
    pub measurement: String,
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("weather locations are empty")]
    NoLocations,
    #[error("location #{0} is blank")]
    BlankLocation(usize),
    #[error("sensor.interval must be greater than zero")]
    InvalidInterval,
    #[error("missing value for '{0}'")]
    MissingValue(&'static str),
}

fn default_units() -> String {
    DEFAULT_UNITS.to_string()
}

fn default_base_url() -> String {
    OPENWEATHERMAP_URL.to_string()
}

impl Settings {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let mut settings: Settings = toml::from_str(contents)?;
        if let Some(location) = settings.weather_api.api_location.take() {
            settings.weather_api.locations.push(location);
        }
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.sensor.interval == 0 {
            return Err(ConfigError::InvalidInterval);
        }

        if self.weather_api.locations.is_empty() {
            return Err(ConfigError::NoLocations);
        }
        if let Some(index) = self
            .weather_api
            .locations
            .iter()
            .position(|location| location.trim().is_empty())
        {
            return Err(ConfigError::BlankLocation(index));
        }

        let required = [
            ("weather_api.appid", &self.weather_api.appid),
            ("weather_api.base_url", &self.weather_api.base_url),
            ("influxdb.hostname", &self.influxdb.hostname),
            ("influxdb.org", &self.influxdb.org),
            ("influxdb.bucket", &self.influxdb.bucket),
            ("influxdb.measurement", &self.influxdb.measurement),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingValue(key));
            }
        }

        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.sensor.interval)
    }

    pub fn locations(&self) -> &[String] {
        &self.weather_api.locations
    }
}
