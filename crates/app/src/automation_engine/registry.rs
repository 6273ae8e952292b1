//! Registry of live components, keyed by automation id.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use fleethub_domain::id::AutomationId;

use super::component::AutomationComponent;
use crate::ports::Ports;

/// The engine's id → component map.
///
/// Components are inserted only once fully initialised, so a lookup never
/// observes a half-built one.
pub(crate) struct ComponentRegistry<P: Ports> {
    components: Mutex<HashMap<AutomationId, Arc<AutomationComponent<P>>>>,
}

impl<P: Ports> Default for ComponentRegistry<P> {
    fn default() -> Self {
        Self {
            components: Mutex::new(HashMap::new()),
        }
    }
}

impl<P: Ports> ComponentRegistry<P> {
    /// Insert a component, returning the one it replaced.
    pub(crate) fn insert(
        &self,
        component: Arc<AutomationComponent<P>>,
    ) -> Option<Arc<AutomationComponent<P>>> {
        self.lock().insert(component.id(), component)
    }

    pub(crate) fn remove(&self, id: AutomationId) -> Option<Arc<AutomationComponent<P>>> {
        self.lock().remove(&id)
    }

    pub(crate) fn get(&self, id: AutomationId) -> Option<Arc<AutomationComponent<P>>> {
        self.lock().get(&id).cloned()
    }

    pub(crate) fn contains(&self, id: AutomationId) -> bool {
        self.lock().contains_key(&id)
    }

    pub(crate) fn ids(&self) -> Vec<AutomationId> {
        self.lock().keys().copied().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    /// Remove and return every component.
    pub(crate) fn drain(&self) -> Vec<Arc<AutomationComponent<P>>> {
        self.lock()
            .drain()
            .map(|(_, component)| component)
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<AutomationId, Arc<AutomationComponent<P>>>> {
        self.components
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
