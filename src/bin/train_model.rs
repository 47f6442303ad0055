//! Offline trainer: fit the ensemble and write a verified model artifact.
//!
//! Usage: train_model <model_dir> [--dataset <csv>] [--seed <u64>] [--strategy average|stacked]
//!
//! Settings not given on the command line come from the `ASTRORISK_*`
//! environment variables. Writes `model.json` and `model.sha256` into
//! `<model_dir>` and prints a JSON summary to stdout.

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};

use astrorisk::adapters::{logging, CsvDatasetSource, JsonModelStore, SyntheticDatasetSource};
use astrorisk::application::{load_training_records, train, EnsembleStrategy, PipelineConfig};
use astrorisk::ports::ModelStore;

fn usage() -> String {
    "Usage: train_model <model_dir> [--dataset <csv>] [--seed <u64>] [--strategy average|stacked]"
        .to_string()
}

fn parse_args() -> Result<(PathBuf, PipelineConfig)> {
    let mut args = env::args().skip(1);
    let mut config = PipelineConfig::from_env_or_default();
    let mut model_dir: Option<PathBuf> = config.model_dir.clone();
    let mut positional_seen = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--dataset" => {
                let v = args.next().ok_or_else(|| anyhow!(usage()))?;
                config.dataset_path = PathBuf::from(v);
            }
            "--seed" => {
                let v = args.next().ok_or_else(|| anyhow!(usage()))?;
                let seed = v.trim().parse::<u64>().context("--seed must be a u64")?;
                config.training.seed = seed;
                config.synthetic_seed = seed;
            }
            "--strategy" => {
                let v = args.next().ok_or_else(|| anyhow!(usage()))?;
                config.training.strategy = EnsembleStrategy::parse(&v)
                    .ok_or_else(|| anyhow!("--strategy must be average or stacked"))?;
            }
            "-h" | "--help" => bail!(usage()),
            _ if !positional_seen => {
                model_dir = Some(PathBuf::from(arg));
                positional_seen = true;
            }
            _ => bail!(usage()),
        }
    }

    let model_dir = model_dir.ok_or_else(|| anyhow!(usage()))?;
    Ok((model_dir, config))
}

fn main() -> Result<()> {
    let _guard = logging::init().context("Failed to initialize logging")?;
    let (model_dir, config) = parse_args()?;

    let csv = CsvDatasetSource::new(&config.dataset_path);
    let synthetic = SyntheticDatasetSource::new(config.synthetic_seed, config.synthetic_rows);
    let data = load_training_records(Some(&csv), &synthetic, &config.cleaning)?;

    let model = train(&data.records, &data.origin, &config.training)?;
    let store = JsonModelStore::new(&model_dir);
    let info = store.save(&model.to_json()?)?;

    let summary = serde_json::json!({
        "model_dir": model_dir.display().to_string(),
        "model_version": model.version(),
        "model_type": model.model_type(),
        "data_origin": data.origin,
        "synthetic_data": data.synthetic,
        "cleaning": data.report,
        "metrics": model.metrics(),
        "sha256": info.sha256,
        "size_bytes": info.size_bytes,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
