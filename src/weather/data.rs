use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

/// Body of a `/data/2.5/weather` response.
///
/// The provider leaves out blocks that do not apply (no `rain` when it is dry,
/// no `grnd_level` for some stations), so every field falls back to its zero
/// value instead of failing the decode. An explicit `null` decodes the same way.
#[derive(Default, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct WeatherRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub coord: Coordinates,
    #[serde(deserialize_with = "null_as_default")]
    pub weather: Vec<Condition>,
    #[serde(deserialize_with = "null_as_default")]
    pub base: String,
    #[serde(deserialize_with = "null_as_default")]
    pub main: MainReading,
    #[serde(deserialize_with = "null_as_default")]
    pub visibility: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub wind: Wind,
    #[serde(deserialize_with = "null_as_default")]
    pub clouds: Clouds,
    #[serde(deserialize_with = "null_as_default")]
    pub rain: Precipitation,
    #[serde(deserialize_with = "null_as_default")]
    pub snow: Precipitation,
    #[serde(deserialize_with = "null_as_default")]
    pub dt: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub sys: System,
    #[serde(deserialize_with = "null_as_default")]
    pub timezone: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub cod: i64,
}

#[derive(Default, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct Coordinates {
    #[serde(deserialize_with = "null_as_default")]
    pub lon: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub lat: f64,
}

#[derive(Default, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct Condition {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub main: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub icon: String,
}

#[derive(Default, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct MainReading {
    #[serde(deserialize_with = "null_as_default")]
    pub temp: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub feels_like: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub temp_min: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub temp_max: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub pressure: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub humidity: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub sea_level: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub grnd_level: f64,
}

#[derive(Default, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct Wind {
    #[serde(deserialize_with = "null_as_default")]
    pub speed: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub deg: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub gust: f64,
}

#[derive(Default, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct Clouds {
    #[serde(deserialize_with = "null_as_default")]
    pub all: i64,
}

/// Rain or snow volume in mm.
#[derive(Default, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct Precipitation {
    #[serde(rename = "1h", deserialize_with = "null_as_default")]
    pub last_hour: f64,
    #[serde(rename = "3h", deserialize_with = "null_as_default")]
    pub last_3_hours: f64,
}

#[derive(Default, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct System {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub type_field: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub country: String,
    #[serde(deserialize_with = "null_as_default")]
    pub sunrise: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub sunset: i64,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl WeatherRecord {
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.dt, 0).single()
    }

    /// Condition descriptions joined with `", "`, e.g. `"light rain, mist"`.
    pub fn conditions(&self) -> String {
        self.weather
            .iter()
            .map(|condition| condition.description.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
