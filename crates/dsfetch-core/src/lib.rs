pub mod config;
pub mod logging;

pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod job;
pub mod manifest;
pub mod progress;
pub mod scheduler;
pub mod storage;
