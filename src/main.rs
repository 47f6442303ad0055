//! Astrorisk: astronaut mission risk prediction.
//!
//! Trains the ensemble (or loads the cached artifact), then answers one JSON
//! request per stdin line with one JSON response per stdout line. The line
//! `status` prints the model status instead.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use astrorisk::adapters::logging;
use astrorisk::application::{training, PipelineConfig, PredictionService};

fn main() -> Result<()> {
    let _guard = logging::init().context("Failed to initialize logging")?;

    tracing::info!("Starting Astrorisk...");
    let config = PipelineConfig::from_env_or_default();
    tracing::info!(
        "Dataset {}, model cache {}",
        config.dataset_path.display(),
        config
            .model_dir
            .as_ref()
            .map_or_else(|| "disabled".to_string(), |d| d.display().to_string())
    );

    let model = training::prepare_model(&config).context("Failed to prepare model")?;
    let service = PredictionService::with_model(model);
    tracing::info!("Ready for requests");

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read request")?;
        let request = line.trim();
        if request.is_empty() {
            continue;
        }

        let response = if request.eq_ignore_ascii_case("status") {
            serde_json::to_value(service.status())?
        } else {
            service.handle_line(request)
        };
        serde_json::to_writer(&mut out, &response)?;
        out.write_all(b"\n")?;
        out.flush()?;
    }

    tracing::info!(
        "Astrorisk shutdown complete after {} predictions.",
        service.prediction_count()
    );
    Ok(())
}
