//! Theatre seat booking simulation binary.

use seatlock_runtime::metrics::MetricsRecorder;
use theatre::{run_simulation, Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = Config::from_env();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        theatres = config.theatre_count,
        seats = config.seats_per_theatre,
        customers = config.customer_count,
        seed = ?config.seed,
        "Configuration loaded"
    );

    let mut metrics = MetricsRecorder::new();
    if config.metrics_enabled {
        metrics.install()?;
    }

    let report = run_simulation(&config).await?;
    println!("{report}");

    if let Some(rendered) = metrics.render() {
        println!("\n{rendered}");
    }

    Ok(())
}
