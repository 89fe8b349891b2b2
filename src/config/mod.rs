//! Configuration module

pub mod cli;
pub mod loader_config;

pub use cli::{CliArgs, EncodingArg, OutputFormat};
pub use loader_config::LoaderConfig;
