use crate::dispatch::{DispatchError, Dispatcher};

use super::ServicePlugin;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Ordered collection of service plugins applied to a dispatcher at startup.
///
/// ```ignore
/// let mut registry = ServiceRegistry::new();
/// registry.add(ApodService::from_env());
/// registry.add(CodeGuardianService::new());
/// registry.apply_all(&mut dispatcher)?;
/// ```
#[derive(Default)]
pub struct ServiceRegistry {
    plugins: Vec<Box<dyn ServicePlugin>>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plugin. Duplicates are kept.
    pub fn add(&mut self, plugin: impl ServicePlugin + 'static) {
        tracing::info!("Registered service plugin: {}", plugin.name());
        self.plugins.push(Box::new(plugin));
    }

    /// Register every plugin onto `dispatcher` in insertion order.
    ///
    /// Stops at the first plugin whose registration fails.
    pub fn apply_all(&self, dispatcher: &mut Dispatcher) -> Result<(), DispatchError> {
        for plugin in &self.plugins {
            plugin.register(dispatcher)?;
            tracing::info!("Applied service plugin: {}", plugin.name());
        }
        Ok(())
    }

    /// Registered plugins in insertion order.
    pub fn plugins(&self) -> &[Box<dyn ServicePlugin>] {
        &self.plugins
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
