//! `imgfetch sources` – list registered image source types.

use anyhow::Result;
use imgfetch_core::source::SourceRegistry;

pub fn run_sources() -> Result<()> {
    let registry = SourceRegistry::with_builtin_sources();
    for source_type in registry.source_types() {
        println!("{}", source_type);
    }
    Ok(())
}
