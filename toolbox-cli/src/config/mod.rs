mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{DEFAULT_LOG_LEVEL, ToolboxConfig};
