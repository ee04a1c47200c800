//! Per-resource serialization for multi-threaded dispatch

use parking_lot::Mutex;
use std::sync::Arc;
use tokengate_core::{Actor, WorldObject};

use crate::effects::WorldEffects;
use crate::feedback::FeedbackMessage;
use crate::resource::GuardedResource;

/// A [`GuardedResource`] behind a per-resource lock
///
/// Each `on_use` holds the lock from verification through reset, so two
/// interactions with the same resource never interleave. Different resources
/// have independent locks.
#[derive(Debug, Clone)]
pub struct SharedResource {
    inner: Arc<Mutex<GuardedResource>>,
}

impl SharedResource {
    /// Wrap a resource
    pub fn new(resource: GuardedResource) -> Self {
        Self {
            inner: Arc::new(Mutex::new(resource)),
        }
    }

    /// Run the use orchestration under the resource lock
    pub fn on_use<W: WorldEffects + ?Sized>(
        &self,
        actor: &Actor,
        supplied: Option<&WorldObject>,
        world: &mut W,
    ) -> FeedbackMessage {
        self.inner.lock().on_use(actor, supplied, world)
    }

    /// Run `f` with exclusive access to the resource
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut GuardedResource) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Copy of the resource's current state
    pub fn snapshot(&self) -> GuardedResource {
        self.inner.lock().clone()
    }
}

impl From<GuardedResource> for SharedResource {
    fn from(resource: GuardedResource) -> Self {
        Self::new(resource)
    }
}
