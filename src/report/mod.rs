//! Batch reporting for the command-line driver

pub mod reporter;

pub use reporter::{BatchReporter, EntryRecord};
