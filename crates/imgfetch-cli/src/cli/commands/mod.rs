//! CLI command handlers. Each command is in its own file.

mod config_path;
mod fetch;
mod sources;

pub use config_path::run_config_path;
pub use fetch::run_fetch;
pub use sources::run_sources;

#[cfg(test)]
pub(crate) use fetch::{apply_overrides, inbound_request, output_path};
