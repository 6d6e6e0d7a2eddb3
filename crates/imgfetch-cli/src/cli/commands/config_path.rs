//! `imgfetch config-path` – show where the config file lives.

use anyhow::Result;
use imgfetch_core::config;

pub fn run_config_path() -> Result<()> {
    let path = config::config_path()?;
    println!("{}", path.display());
    Ok(())
}
