use chrono::Utc;
use color_eyre::eyre::Result;
use crl_sensor::{
    cli::{self, Cli, Invocation},
    config::Config,
    pki::crl::HttpCrlFetcher,
    sensor::{CrlSensor, SensorReport, prtg},
    telemetry,
};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    // Every failure still has to reach PRTG as a sensor document on stdout
    let cli = match cli::parse_args(std::env::args_os()) {
        Ok(Invocation::Run(cli)) => cli,
        Ok(Invocation::Invalid(message)) => {
            tracing::error!("Invalid arguments: {}", message);
            println!("{}", prtg::render_error(&message)?);
            return Ok(());
        }
        Err(e) => e.exit(),
    };

    let xml = match run(&cli).await {
        Ok(report) => prtg::render_report(&report)?,
        Err(report) => {
            let message = report
                .chain()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(": ");
            tracing::error!("CRL check failed: {}", message);
            prtg::render_error(&message)?
        }
    };

    println!("{xml}");
    Ok(())
}

async fn run(cli: &Cli) -> Result<SensorReport> {
    let config = Config::load_with_overrides(cli.overrides())?;
    tracing::debug!("Loaded configuration: {:?}", config);

    let fetcher = HttpCrlFetcher::with_timeout(config.sensor.timeout_secs)?;
    let sensor = CrlSensor::new(fetcher, config.sensor);

    let report = sensor.run(Utc::now()).await?;
    tracing::info!("Sensor status: {}", report.status);
    Ok(report)
}
