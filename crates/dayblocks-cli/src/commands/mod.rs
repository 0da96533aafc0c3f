pub mod completions;
pub mod config;
pub mod duration;
pub mod productivity;
pub mod run;
pub mod sequence;
pub mod sessions;
pub mod sleep;

use std::sync::Arc;

use dayblocks_core::{Config, HttpBackend};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub fn backend(config: &Config) -> Result<Arc<HttpBackend>, Box<dyn std::error::Error>> {
    Ok(Arc::new(HttpBackend::from_config(&config.server)?))
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
