use crate::{
    config::InfluxSettings,
    point::{FieldValue, MeasurementPoint},
};
use chrono::{DateTime, Utc};
use influxrs::{InfluxClient, Measurement};
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum WriteError {
    #[error("failed to create influx client: {0}")]
    Client(String),
    #[error("invalid point: {0}")]
    Point(String),
    #[error("failed to write point: {0}")]
    Write(String),
}

/// Writes points to InfluxDB, one client per write.
///
/// The client is created, used for exactly one point and dropped before
/// [`InfluxWriter::write`] returns, on both the success and error paths.
pub(crate) struct InfluxWriter<'a> {
    settings: &'a InfluxSettings,
}

impl<'a> InfluxWriter<'a> {
    pub fn new(settings: &'a InfluxSettings) -> Self {
        Self { settings }
    }

    pub async fn write(&self, point: &MeasurementPoint) -> Result<(), WriteError> {
        let measurement = to_measurement(point, Utc::now())?;

        let client = InfluxClient::builder(
            self.settings.hostname.to_owned(),
            self.settings.token.to_owned(),
            self.settings.org.to_owned(),
        )
        .build()
        .map_err(|e| WriteError::Client(format!("{:?}", e)))?;

        let timer = Instant::now();
        client
            .write(&self.settings.bucket, &[measurement])
            .await
            .map_err(|influx_err| WriteError::Write(format!("{}", influx_err)))?;
        debug!("writing point to influx took {:?}", timer.elapsed());

        Ok(())
    }
}

fn to_measurement(point: &MeasurementPoint, at: DateTime<Utc>) -> Result<Measurement, WriteError> {
    let mut builder = Measurement::builder(point.measurement.as_str());
    for (key, value) in &point.tags {
        // line protocol has no empty tag values
        if value.is_empty() {
            continue;
        }
        builder = builder.tag(*key, value.as_str());
    }
    for (key, value) in &point.fields {
        builder = match *value {
            FieldValue::Float(value) => builder.field(*key, value),
            FieldValue::Integer(value) => builder.field(*key, value),
        };
    }

    builder
        .timestamp_ms(at.timestamp_millis() as u128)
        .build()
        .map_err(|e| WriteError::Point(format!("{:?}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{serve_once, unused_address};

    fn settings(hostname: String) -> InfluxSettings {
        InfluxSettings {
            hostname,
            token: "token".to_string(),
            org: "home".to_string(),
            bucket: "weather".to_string(),
            measurement: "weather".to_string(),
        }
    }

    fn berlin() -> MeasurementPoint {
        MeasurementPoint {
            measurement: "weather".to_string(),
            tags: vec![
                ("location", "Berlin".to_string()),
                ("city", "Berlin".to_string()),
                ("country", "DE".to_string()),
            ],
            fields: vec![
                ("temperature", FieldValue::Float(10.5)),
                ("visibility", FieldValue::Integer(10000)),
            ],
        }
    }

    #[test]
    fn empty_tags_are_left_out() {
        let mut point = berlin();
        point.tags[2].1 = String::new();

        let line = to_measurement(&point, Utc::now())
            .unwrap()
            .to_line_protocol();

        assert!(!line.contains("country="), "{}", line);
        assert!(line.contains("location=Berlin"), "{}", line);
        assert!(line.contains("city=Berlin"), "{}", line);
    }

    #[tokio::test]
    async fn point_is_posted_to_the_configured_bucket() {
        let stub = serve_once("204 No Content", "").await;
        let settings = settings(stub.base_url.clone());

        InfluxWriter::new(&settings).write(&berlin()).await.unwrap();

        let request = stub.request().await;
        assert!(request.starts_with("POST "), "{}", request);
        assert!(request.contains("bucket=weather"), "{}", request);
        assert!(request.contains("location=Berlin"), "{}", request);
        assert!(request.contains("temperature=10.5"), "{}", request);
    }

    #[tokio::test]
    async fn unreachable_store_is_a_write_error() {
        let settings = settings(format!("http://{}", unused_address().await));

        let result = InfluxWriter::new(&settings).write(&berlin()).await;

        assert!(matches!(result, Err(WriteError::Write(_))));
    }
}
