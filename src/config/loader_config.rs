//! Loader configuration derived from CLI arguments

use std::path::PathBuf;

use super::cli::{CliArgs, OutputFormat};
use crate::dataset::LoadOptions;
use crate::utils::LoaderError;

/// Complete run configuration
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    // Archives
    pub images_path: PathBuf,
    pub labels_path: PathBuf,
    pub load: LoadOptions,

    // Sampling
    pub batch_size: u32,
    pub batches: u64,

    // Output
    pub output_format: OutputFormat,
    pub quiet: bool,
    pub verbose: bool,
}

impl LoaderConfig {
    /// Create configuration from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self, LoaderError> {
        args.validate().map_err(LoaderError::Config)?;

        let encoding = args.encoding.into();
        let load = LoadOptions {
            image_encoding: encoding,
            label_encoding: encoding,
            check_counts: !args.no_count_check,
            start: args.start,
            chunk_size: args.chunk_size,
        };

        Ok(Self {
            images_path: args.images.clone(),
            labels_path: args.labels.clone(),
            load,
            batch_size: args.batch_size,
            batches: args.batches,
            output_format: args.output_format,
            quiet: args.quiet,
            verbose: args.verbose,
        })
    }
}
