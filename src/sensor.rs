use crate::{
    config::Settings,
    influx::{InfluxWriter, WriteError},
    point::{self, MeasurementPoint},
    weather::{FetchError, WeatherClient, WeatherRecord},
};
use std::{future::Future, time::Duration};
use tokio::sync::mpsc::{self, error::TrySendError};

/// Where weather records come from.
pub(crate) trait WeatherSource {
    async fn fetch(&self, location: &str) -> Result<WeatherRecord, FetchError>;
}

/// Where measurement points go.
pub(crate) trait PointSink {
    async fn write(&self, point: &MeasurementPoint) -> Result<(), WriteError>;
}

impl WeatherSource for WeatherClient<'_> {
    async fn fetch(&self, location: &str) -> Result<WeatherRecord, FetchError> {
        WeatherClient::fetch(self, location).await
    }
}

impl PointSink for InfluxWriter<'_> {
    async fn write(&self, point: &MeasurementPoint) -> Result<(), WriteError> {
        InfluxWriter::write(self, point).await
    }
}

/// Outcome of one pass over every configured location.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct PassReport {
    pub written: usize,
    pub fetch_failures: Vec<String>,
    pub write_failures: Vec<String>,
}

pub(crate) struct Sensor<'a, S, W> {
    source: S,
    sink: W,
    locations: &'a [String],
    measurement: &'a str,
}

impl<'a, S, W> Sensor<'a, S, W>
where
    S: WeatherSource,
    W: PointSink,
{
    pub fn new(source: S, sink: W, settings: &'a Settings) -> Self {
        Self {
            source,
            sink,
            locations: settings.locations(),
            measurement: &settings.influxdb.measurement,
        }
    }

    /// Fetches and writes every location in listed order.
    ///
    /// A failing location is logged and skipped; the rest of the pass goes on.
    pub async fn run_pass(&self) -> PassReport {
        let mut report = PassReport::default();

        for location in self.locations {
            let record = match self.source.fetch(location).await {
                Ok(record) => record,
                Err(e) => {
                    error!("error fetching the weather for '{}': {}", location, e);
                    report.fetch_failures.push(location.clone());
                    continue;
                }
            };
            info!("weather fetched for location '{}'", location);
            debug!(
                "{} ({}) at ({}, {}): {}, observed at {:?}",
                record.name,
                record.sys.country,
                record.coord.lat,
                record.coord.lon,
                record.conditions(),
                record.observed_at()
            );

            let point = point::to_point(&record, location, self.measurement);
            match self.sink.write(&point).await {
                Ok(()) => report.written += 1,
                Err(e) => {
                    error!("error writing the weather for '{}': {}", location, e);
                    report.write_failures.push(location.clone());
                }
            }
        }

        report
    }

    /// Runs a pass now and one more per tick until `shutdown` resolves or the
    /// ticker goes away.
    ///
    /// `shutdown` is checked before `ticks` whenever both are ready.
    pub async fn run<F>(&self, mut ticks: mpsc::Receiver<()>, shutdown: F)
    where
        F: Future<Output = &'static str>,
    {
        tokio::pin!(shutdown);

        loop {
            let report = self.run_pass().await;
            info!(
                "pass finished: {} written, {} fetch failures, {} write failures",
                report.written,
                report.fetch_failures.len(),
                report.write_failures.len()
            );

            tokio::select! {
                biased;
                signal = &mut shutdown => {
                    info!("signal {} captured, exiting...", signal);
                    return;
                }
                tick = ticks.recv() => {
                    if tick.is_none() {
                        warn!("ticker stopped, exiting...");
                        return;
                    }
                    trace!("tick received");
                }
            }
        }
    }
}

/// Spawns the timer task. It holds at most one undelivered tick; ticks that
/// find the slot occupied are dropped.
pub(crate) fn spawn_ticker(period: Duration) -> mpsc::Receiver<()> {
    let (tx, rx) = mpsc::channel(1);

    tokio::spawn(async move {
        loop {
            tokio::time::sleep(period).await;
            match tx.try_send(()) {
                Ok(()) => {}
                Err(TrySendError::Full(())) => debug!("previous tick still pending, dropping tick"),
                Err(TrySendError::Closed(())) => break,
            }
        }
    });

    rx
}

/// SIGINT/SIGTERM listener, registered as soon as it is created.
pub(crate) struct Shutdown {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl Shutdown {
    #[cfg(unix)]
    pub fn listen() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    #[cfg(not(unix))]
    pub fn listen() -> std::io::Result<Self> {
        Ok(Self {})
    }

    /// Resolves with the name of the first termination signal received.
    #[cfg(unix)]
    pub async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
        }
    }

    #[cfg(not(unix))]
    pub async fn recv(&mut self) -> &'static str {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(e) => {
                error!("failed to listen for ctrl-c: {}", e);
                std::future::pending().await
            }
        }
    }
}
