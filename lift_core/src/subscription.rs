//! Live-update subscriptions for store documents.
//!
//! A [`Hub`] fans out published snapshots to the handlers registered under a
//! key. Registering returns a [`Subscription`] guard; dropping it (or calling
//! [`Subscription::unsubscribe`]) removes the handler, after which it is never
//! invoked again.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Entry<K, T> {
    key: K,
    active: Arc<AtomicBool>,
    handler: Handler<T>,
}

struct Registry<K, T> {
    next_id: u64,
    entries: HashMap<u64, Entry<K, T>>,
}

/// Registry of change handlers keyed by the document they watch
pub struct Hub<K, T> {
    registry: Arc<Mutex<Registry<K, T>>>,
}

impl<K, T> Default for Hub<K, T> {
    fn default() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                entries: HashMap::new(),
            })),
        }
    }
}

impl<K, T> Hub<K, T>
where
    K: PartialEq + Send + 'static,
    T: 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for changes published under `key`
    pub fn subscribe<F>(&self, key: K, handler: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let active = Arc::new(AtomicBool::new(true));
        let id = {
            let mut registry = self.lock();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.entries.insert(
                id,
                Entry {
                    key,
                    active: Arc::clone(&active),
                    handler: Arc::new(handler),
                },
            );
            id
        };

        let registry: Weak<Mutex<Registry<K, T>>> = Arc::downgrade(&self.registry);
        Subscription {
            active,
            release: Some(Box::new(move || {
                if let Some(registry) = registry.upgrade() {
                    let mut registry = registry.lock().unwrap_or_else(|e| e.into_inner());
                    registry.entries.remove(&id);
                }
            })),
        }
    }

    /// Deliver `value` to every live handler registered under `key`
    ///
    /// Handlers run outside the registry lock, so they may subscribe or
    /// unsubscribe re-entrantly.
    pub fn publish(&self, key: &K, value: &T) -> usize {
        let targets: Vec<(Arc<AtomicBool>, Handler<T>)> = self
            .lock()
            .entries
            .values()
            .filter(|entry| entry.key == *key)
            .map(|entry| (Arc::clone(&entry.active), Arc::clone(&entry.handler)))
            .collect();

        let mut delivered = 0;
        for (active, handler) in targets {
            if active.load(Ordering::SeqCst) {
                handler(value);
                delivered += 1;
            }
        }
        delivered
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Registry<K, T>> {
        self.registry.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Guard for a registered handler; releases it on drop
#[must_use = "dropping a Subscription immediately cancels it"]
pub struct Subscription {
    active: Arc<AtomicBool>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Stop receiving updates
    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn cancel(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
