//! Source registry: source type name -> constructor.
//!
//! Built once during process setup and handed to the dispatcher by reference.

use std::collections::BTreeMap;
use std::sync::Arc;

use ::http::Request;

use super::{HttpImageSource, ImageSource, SourceType};
use crate::config::SourceConfig;
use crate::error::ConfigError;

/// Builds a source from the shared configuration.
pub type SourceFactory = fn(Arc<SourceConfig>) -> Result<Box<dyn ImageSource>, ConfigError>;

#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    factories: BTreeMap<SourceType, SourceFactory>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every source shipped in this crate.
    pub fn with_builtin_sources() -> Self {
        let mut registry = Self::new();
        register_builtin_sources(&mut registry);
        registry
    }

    /// Registers `factory` under `source_type`, returning the factory it replaced.
    pub fn register(
        &mut self,
        source_type: SourceType,
        factory: SourceFactory,
    ) -> Option<SourceFactory> {
        self.factories.insert(source_type, factory)
    }

    pub fn get(&self, source_type: SourceType) -> Option<SourceFactory> {
        self.factories.get(&source_type).copied()
    }

    /// Registered types in name order.
    pub fn source_types(&self) -> Vec<SourceType> {
        self.factories.keys().copied().collect()
    }

    /// Constructs every registered source against one shared configuration.
    pub fn build(
        &self,
        config: Arc<SourceConfig>,
    ) -> Result<Vec<(SourceType, Box<dyn ImageSource>)>, ConfigError> {
        self.factories
            .iter()
            .map(|(ty, factory)| {
                let source = factory(Arc::clone(&config))?;
                tracing::debug!(source = %ty, "image source ready");
                Ok((*ty, source))
            })
            .collect()
    }
}

/// Registers the built-in sources. Call once during startup.
pub fn register_builtin_sources(registry: &mut SourceRegistry) {
    registry.register(SourceType::HTTP, HttpImageSource::factory);
}

/// First source whose routing predicate accepts `req`.
pub fn select<'a>(
    sources: &'a [(SourceType, Box<dyn ImageSource>)],
    req: &Request<()>,
) -> Option<(SourceType, &'a dyn ImageSource)> {
    sources
        .iter()
        .find(|(_, source)| source.matches(req))
        .map(|(ty, source)| (*ty, source.as_ref()))
}
