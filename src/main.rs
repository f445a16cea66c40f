#[macro_use]
extern crate log;

use clap::Parser;
use config::{ConfigError, Settings};
use influx::InfluxWriter;
use sensor::{Sensor, Shutdown};
use thiserror::Error;
use weather::WeatherClient;

mod config;
mod influx;
mod point;
mod sensor;
#[cfg(test)]
mod test_support;
mod weather;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Opts {
    /// Path to the TOML settings document
    #[clap(long, short, env = "WEATHER_SENSOR_CONFIG", default_value = "config.toml")]
    config: String,
}

#[derive(Debug, Error)]
enum StartupError {
    #[error("error loading config: {0}")]
    Config(#[from] ConfigError),
    #[error("error creating http client: {0}")]
    HttpClient(#[from] isahc::Error),
    #[error("error installing signal handlers: {0}")]
    Signals(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    pretty_env_logger::formatted_timed_builder()
        .parse_filters(&std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();
    let opts = Opts::parse();

    if let Err(e) = run(opts).await {
        error!("{}, aborting...", e);
        std::process::exit(1);
    }
}

async fn run(opts: Opts) -> Result<(), StartupError> {
    let settings = Settings::from_file(&opts.config)?;
    info!(
        "starting weather virtual sensor reporting each {} seconds for {:?}...",
        settings.sensor.interval,
        settings.locations()
    );

    let client = WeatherClient::new(&settings.weather_api)?;
    let writer = InfluxWriter::new(&settings.influxdb);
    let mut shutdown = Shutdown::listen()?;
    let ticks = sensor::spawn_ticker(settings.interval());

    Sensor::new(client, writer, &settings)
        .run(ticks, shutdown.recv())
        .await;

    Ok(())
}
