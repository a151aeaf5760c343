//! Shared cache of controller descriptions.

use std::sync::Arc;

use dashmap::DashMap;
use hypatia_core::ControllerMetadata;

use crate::description::{ControllerDescriptionBuilder, ControllerInfo};
use crate::error::DescriptionError;

/// Controller descriptions keyed by type name, built at most once each.
///
/// Lookups run concurrently; building a missing description holds that
/// entry's shard, so racing callers for the same type wait for a single
/// build instead of repeating it.
///
/// ```rust
/// use hypatia_core::fixtures;
/// use hypatia_router::DescriptionCache;
/// use std::sync::Arc;
///
/// let cache = DescriptionCache::default();
/// let first = cache.get_or_build(&fixtures::person_controller_metadata()).unwrap();
/// let second = cache.get_or_build(&fixtures::person_controller_metadata()).unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
#[derive(Debug, Default)]
pub struct DescriptionCache {
    builder: ControllerDescriptionBuilder,
    entries: DashMap<String, Arc<ControllerInfo>>,
}

impl DescriptionCache {
    /// Creates an empty cache that describes controllers with `builder`.
    #[must_use]
    pub fn new(builder: ControllerDescriptionBuilder) -> Self {
        Self {
            builder,
            entries: DashMap::new(),
        }
    }

    /// Returns the builder used for missing entries.
    #[must_use]
    pub fn builder(&self) -> &ControllerDescriptionBuilder {
        &self.builder
    }

    /// Returns the cached description, building it on first use.
    pub fn get_or_build(&self, metadata: &ControllerMetadata) -> Result<Arc<ControllerInfo>, DescriptionError> {
        if let Some(existing) = self.get(metadata.type_name()) {
            return Ok(existing);
        }

        let entry = self
            .entries
            .entry(metadata.type_name().to_string())
            .or_try_insert_with(|| {
                tracing::debug!(controller = metadata.type_name(), "building controller description");
                self.builder.build(metadata).map(Arc::new)
            })?;
        Ok(Arc::clone(entry.value()))
    }

    /// Returns a cached description.
    #[must_use]
    pub fn get(&self, type_name: &str) -> Option<Arc<ControllerInfo>> {
        self.entries.get(type_name).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns the number of cached descriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
