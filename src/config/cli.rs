//! Command-line argument parsing

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::dataset::{Encoding, DEFAULT_CHUNK_SIZE};

/// Stream labeled, normalized batches out of gzip-compressed IDX archives
#[derive(Parser, Debug, Clone)]
#[command(name = "mnist-stream")]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    // ===== Archives =====
    /// Image archive (idx3, gzip or raw)
    #[arg(long = "images", default_value = "resources/t10k-images-idx3-ubyte.gz")]
    pub images: PathBuf,

    /// Label archive (idx1, gzip or raw)
    #[arg(long = "labels", default_value = "resources/t10k-labels-idx1-ubyte.gz")]
    pub labels: PathBuf,

    /// Content encoding of both archives
    #[arg(long = "encoding", value_enum, default_value_t = EncodingArg::Auto)]
    pub encoding: EncodingArg,

    /// Read size in bytes when draining the archive files
    #[arg(long = "chunk-size", default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Accept label archives whose record count differs from the image archive
    #[arg(long = "no-count-check")]
    pub no_count_check: bool,

    // ===== Sampling =====
    /// Entries per batch
    #[arg(short = 'b', long = "batch-size", default_value_t = 8)]
    pub batch_size: u32,

    /// Number of batches to draw
    #[arg(short = 'n', long = "batches", default_value_t = 1)]
    pub batches: u64,

    /// Initial cursor position (wraps modulo the record count)
    #[arg(long = "start", default_value_t = 0)]
    pub start: u64,

    // ===== Output Options =====
    /// Output format
    #[arg(long = "output-format", value_enum, default_value_t = OutputFormat::Text)]
    pub output_format: OutputFormat,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Archive content encoding
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodingArg {
    /// Detect gzip from the stream's first bytes
    #[default]
    Auto,
    Gzip,
    Identity,
}

impl From<EncodingArg> for Encoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Auto => Encoding::Auto,
            EncodingArg::Gzip => Encoding::Gzip,
            EncodingArg::Identity => Encoding::Identity,
        }
    }
}

/// Output format for batches
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl CliArgs {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate argument combinations
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("--chunk-size must be at least 1".to_string());
        }

        if self.quiet && self.verbose {
            return Err("--quiet and --verbose are mutually exclusive".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = CliArgs::parse_from(["test"]);
        assert_eq!(args.batch_size, 8);
        assert_eq!(args.batches, 1);
        assert_eq!(args.start, 0);
        assert_eq!(args.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(args.encoding, EncodingArg::Auto);
        assert_eq!(args.output_format, OutputFormat::Text);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_archive_and_sampling_args() {
        let args = CliArgs::parse_from([
            "test",
            "--images",
            "train-images.idx3",
            "--labels",
            "train-labels.idx1",
            "--encoding",
            "identity",
            "-b",
            "32",
            "-n",
            "4",
            "--start",
            "59999",
            "--output-format",
            "json",
        ]);
        assert_eq!(args.images, PathBuf::from("train-images.idx3"));
        assert_eq!(args.labels, PathBuf::from("train-labels.idx1"));
        assert_eq!(Encoding::from(args.encoding), Encoding::Identity);
        assert_eq!(args.batch_size, 32);
        assert_eq!(args.batches, 4);
        assert_eq!(args.start, 59999);
        assert_eq!(args.output_format, OutputFormat::Json);
    }

    #[test]
    fn test_validate_rejects_bad_combinations() {
        let args = CliArgs::parse_from(["test", "--chunk-size", "0"]);
        assert!(args.validate().is_err());

        let args = CliArgs::parse_from(["test", "-q", "-v"]);
        assert!(args.validate().is_err());
    }
}
