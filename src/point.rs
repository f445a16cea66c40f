use crate::weather::WeatherRecord;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum FieldValue {
    Float(f64),
    Integer(i64),
}

/// One sensor reading for one location, ready to be written.
///
/// The timestamp is not part of the point; the writer stamps it with the
/// write time.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MeasurementPoint {
    pub measurement: String,
    pub tags: Vec<(&'static str, String)>,
    pub fields: Vec<(&'static str, FieldValue)>,
}

#[cfg(test)]
impl MeasurementPoint {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn field(&self, key: &str) -> Option<FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| *value)
    }
}

pub(crate) fn to_point(record: &WeatherRecord, location: &str, measurement: &str) -> MeasurementPoint {
    use FieldValue::{Float, Integer};

    MeasurementPoint {
        measurement: measurement.to_string(),
        tags: vec![
            ("location", location.to_string()),
            ("city", record.name.clone()),
            ("country", record.sys.country.clone()),
        ],
        fields: vec![
            ("visibility", Integer(record.visibility)),
            ("clouds", Integer(record.clouds.all)),
            ("wind_speed", Float(record.wind.speed)),
            ("wind_bearing", Float(record.wind.deg)),
            ("wind_gusts", Float(record.wind.gust)),
            ("rain_1h", Float(record.rain.last_hour)),
            ("rain_3h", Float(record.rain.last_3_hours)),
            ("snow_1h", Float(record.snow.last_hour)),
            ("snow_3h", Float(record.snow.last_3_hours)),
            ("humidity", Float(record.main.humidity)),
            ("temperature", Float(record.main.temp)),
            ("temperature_max", Float(record.main.temp_max)),
            ("temperature_min", Float(record.main.temp_min)),
            ("pressure", Float(local_pressure(record))),
        ],
    }
}

/// Pressure at the station's elevation when reported, sea-level pressure otherwise.
fn local_pressure(record: &WeatherRecord) -> f64 {
    if record.main.grnd_level == 0.0 {
        record.main.pressure
    } else {
        record.main.grnd_level
    }
}
