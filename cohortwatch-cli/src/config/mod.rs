mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{CohortwatchConfig, DEFAULT_HOST, DEFAULT_PORT};
