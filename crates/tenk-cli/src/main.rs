//! tenk - chunk extracted 10-K filings into JSON lines for embedding.
//!
//! Takes no arguments: everything comes from the config file found by
//! `TenkConfig::load_default`. Set `RUST_LOG` to change verbosity.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use tenk_batch::{BatchCoordinator, FilingDirectory, JsonCheckpointStore, JsonlSink};
use tenk_chunk::FilingChunker;
use tenk_core::TenkConfig;

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logging();

    let config = TenkConfig::load_default()?;
    config.validate()?;

    let batch = &config.batch;
    if !batch.input_dir.is_dir() {
        eprintln!(
            "Input directory {} does not exist. Set batch.input_dir in tenk.toml.",
            batch.input_dir.display()
        );
        std::process::exit(1);
    }

    info!("Input: {}", batch.input_dir.display());
    info!("Output: {}", batch.output_path.display());

    let chunker = Arc::new(FilingChunker::new(config.chunking.clone()));
    let coordinator = BatchCoordinator::new(chunker, batch.clone());

    let inputs = FilingDirectory::new(&batch.input_dir).inputs()?;
    let mut sink = JsonlSink::open(&batch.output_path)?;
    let mut store = JsonCheckpointStore::new(&batch.checkpoint_path);

    let report = coordinator.run(inputs, &mut sink, &mut store).await?;

    println!("\nChunking complete\n");
    print!("{}", report);
    println!("Output: {}", batch.output_path.display());

    if report.write_error_log(&batch.error_log_path)? {
        println!(
            "{} failed documents logged to: {}",
            report.errors.len(),
            batch.error_log_path.display()
        );
    }

    Ok(())
}
