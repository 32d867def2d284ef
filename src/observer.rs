//! Observer registry for engine notifications.
//!
//! Subscribers are plain callbacks. Notification takes a snapshot of the
//! subscriber list and calls it with no lock held, so a callback may
//! subscribe, unsubscribe, or call back into the engine.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Subscribers<T> {
    next_id: AtomicU64,
    entries: Mutex<Vec<(u64, Callback<T>)>>,
}

impl<T> Subscribers<T> {
    fn lock(&self) -> MutexGuard<'_, Vec<(u64, Callback<T>)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, id: u64) -> bool {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    fn contains(&self, id: u64) -> bool {
        self.lock().iter().any(|(entry_id, _)| *entry_id == id)
    }
}

/// A set of callbacks notified with values of type `T`.
///
/// Cloning the registry yields another handle to the same subscriber set.
pub struct ObserverRegistry<T> {
    inner: Arc<Subscribers<T>>,
}

impl<T: 'static> ObserverRegistry<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Subscribers {
                next_id: AtomicU64::new(0),
                entries: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Registers `callback` and returns the handle that removes it.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.lock().push((id, Arc::new(callback)));

        let registry: Weak<Subscribers<T>> = Arc::downgrade(&self.inner);
        Subscription {
            id,
            remove: Some(Box::new(move || {
                registry
                    .upgrade()
                    .map(|subscribers| subscribers.remove(id))
                    .unwrap_or(false)
            })),
        }
    }

    /// Calls every current subscriber with `value`.
    ///
    /// A subscriber removed by an earlier callback in the same round is
    /// skipped; one added during the round is first called next time.
    pub fn notify_all(&self, value: &T) {
        let round: Vec<(u64, Callback<T>)> = self.inner.lock().clone();
        for (id, callback) in round {
            if self.inner.contains(id) {
                callback(value);
            }
        }
    }

    /// Removes every subscriber.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: 'static> Default for ObserverRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ObserverRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for ObserverRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("subscribers", &self.inner.lock().len())
            .finish()
    }
}

/// Handle returned by [`ObserverRegistry::subscribe`].
///
/// Dropping the handle does *not* unsubscribe; call [`unsubscribe`](Self::unsubscribe).
#[must_use = "dropping a Subscription keeps the callback registered forever"]
pub struct Subscription {
    id: u64,
    remove: Option<Box<dyn FnOnce() -> bool + Send + Sync>>,
}

impl Subscription {
    /// Identifier of the subscription within its registry.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Removes the callback. Returns false if it was already gone.
    pub fn unsubscribe(mut self) -> bool {
        self.remove.take().map(|remove| remove()).unwrap_or(false)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
