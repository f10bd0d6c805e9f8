use anyhow::{Context, Result};
use fpv_simulation::config::Config;
use fpv_simulation::portfolio::{FpvSimulation, RegistrationRow, RunOptions};
use fpv_simulation::simulation::PowerModel;
use fpv_simulation::telemetry::init_tracing;
use fpv_simulation::weather::{CachedWeatherSource, PvgisClient, WeatherSource};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = Config::load()?;

    let registrations = tokio::fs::read_to_string(&cfg.simulation.registrations)
        .await
        .with_context(|| {
            format!(
                "Failed to read registrations from {}",
                cfg.simulation.registrations.display()
            )
        })?;
    let rows: Vec<RegistrationRow> =
        serde_json::from_str(&registrations).context("Failed to parse registrations")?;

    let mut simulation = FpvSimulation::new();
    simulation.set_parameters(&cfg.module)?;
    simulation.register_lakes(rows)?;

    info!(
        lakes = simulation.lakes().count(),
        systems = simulation.system_count(),
        "registered lakes"
    );

    let client = PvgisClient::new(&cfg.pvgis);
    let source: Box<dyn WeatherSource> = match cfg.cache.active_directory() {
        Some(dir) => {
            info!(directory = %dir.display(), "TMY file cache enabled");
            Box::new(CachedWeatherSource::new(client, dir))
        }
        None => Box::new(client),
    };

    let options = RunOptions {
        workers: cfg.simulation.workers,
        model: PowerModel::new(cfg.simulation.area_scale_m2),
    };
    let report = simulation.annual_energy_yield(source.as_ref(), &options).await;

    if let Some(parent) = cfg.simulation.output.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(&report.rows)?;
    tokio::fs::write(&cfg.simulation.output, json)
        .await
        .with_context(|| format!("Failed to write {}", cfg.simulation.output.display()))?;

    info!(
        output = %cfg.simulation.output.display(),
        rows = report.rows.len(),
        total_energy_yield_kwh = report.total_energy_yield_kwh(),
        "annual energy yield written"
    );

    for failure in &report.failures {
        warn!(
            lake_id = %failure.lake_id,
            system_index = failure.system_index,
            latitude = failure.latitude,
            longitude = failure.longitude,
            error = %failure.error,
            "system not simulated"
        );
    }
    if !report.is_complete() {
        anyhow::bail!("{} system(s) failed to simulate", report.failures.len());
    }
    Ok(())
}
