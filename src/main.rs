//! mnist-stream - draw endless batches from gzip-compressed IDX archives
//!
//! Loads an image and a label archive once, then pulls `--batches` batches
//! of `--batch-size` entries, wrapping around the dataset as needed.

use anyhow::{Context, Result};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use mnist_stream::config::{CliArgs, LoaderConfig};
use mnist_stream::report::BatchReporter;
use mnist_stream::Dataset;

fn setup_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

async fn run() -> Result<()> {
    let args = CliArgs::parse_args();
    setup_logging(args.verbose, args.quiet);

    let config = LoaderConfig::from_cli(&args)?;

    info!(
        "Loading images from {:?}, labels from {:?}",
        config.images_path, config.labels_path
    );
    let mut dataset = Dataset::with_options(config.load.clone());
    dataset
        .load_files(&config.images_path, &config.labels_path)
        .await
        .context("Failed to load dataset")?;

    let mut reporter = BatchReporter::stdout(config.output_format);
    reporter.report_dataset(&dataset)?;

    for batch in 0..config.batches {
        let entries = dataset.next_batch(config.batch_size);
        reporter.report_batch(batch, &entries)?;
    }

    info!("Done, cursor at {}", dataset.cursor());
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
