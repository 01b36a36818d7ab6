use anyhow::{Context, Result};
use pmcast::{AppState, ForecastPipeline, PmcastConfig, Presenter, telemetry, web};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = PmcastConfig::load().context("Failed to load configuration")?;
    let _telemetry = telemetry::init(&config.logging)?;

    info!(
        "pmcast {} starting with {} pollutant model(s)",
        pmcast::VERSION,
        config.pollutants.len()
    );

    let pipeline =
        ForecastPipeline::from_config(&config).context("Failed to assemble forecast pipeline")?;
    let forecast = pipeline.run_today().context("Failed to generate forecast")?;

    for outcome in forecast.degraded() {
        tracing::warn!("{} is showing placeholder values", outcome.pollutant);
    }

    let presenter = Presenter::new(&config.dashboard.title, config.dashboard.chart_kind);
    let state = AppState::new(forecast, &presenter);

    web::run(&config.server, state).await
}
