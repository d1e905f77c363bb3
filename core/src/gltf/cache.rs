//! Per-asset resolver cache with request coalescing.
//!
//! A slot is inserted as `Pending` before the first suspension point, so
//! every caller asking for the same index while the load is in flight
//! awaits the same [`Shared`] future. Success replaces the slot with
//! `Ready`; failure clears it so a later call can retry.

use std::collections::HashMap;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;

use super::error::GltfError;

type SharedLoad<T> = Shared<BoxFuture<'static, Result<T, GltfError>>>;

enum Slot<T> {
    Pending { id: u64, load: SharedLoad<T> },
    Ready(T),
}

struct Slots<T> {
    next_id: u64,
    entries: HashMap<usize, Slot<T>>,
}

pub(crate) struct ResolverCache<T> {
    name: &'static str,
    slots: Mutex<Slots<T>>,
}

impl<T: Clone + Send + Sync + 'static> ResolverCache<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slots: Mutex::new(Slots {
                next_id: 0,
                entries: HashMap::new(),
            }),
        }
    }

    /// Return the cached value for `index`, join the in-flight load, or
    /// start a new one with `start`.
    ///
    /// `start` runs at most once per miss and must not block.
    pub async fn get_or_load(
        &self,
        index: usize,
        start: impl FnOnce() -> BoxFuture<'static, Result<T, GltfError>>,
    ) -> Result<T, GltfError> {
        let (id, load) = {
            let mut slots = self.slots.lock();
            match slots.entries.get(&index) {
                Some(Slot::Ready(value)) => {
                    log::trace!("{} {index}: cache hit", self.name);
                    return Ok(value.clone());
                }
                Some(Slot::Pending { id, load }) => {
                    log::trace!("{} {index}: joining in-flight load", self.name);
                    (*id, load.clone())
                }
                None => {
                    log::debug!("{} {index}: loading", self.name);
                    let id = slots.next_id;
                    slots.next_id += 1;
                    let load = start().shared();
                    slots.entries.insert(
                        index,
                        Slot::Pending {
                            id,
                            load: load.clone(),
                        },
                    );
                    (id, load)
                }
            }
        };

        let result = load.await;

        let mut slots = self.slots.lock();
        let still_ours = matches!(
            slots.entries.get(&index),
            Some(Slot::Pending { id: pending, .. }) if *pending == id
        );
        if still_ours {
            match &result {
                Ok(value) => {
                    slots.entries.insert(index, Slot::Ready(value.clone()));
                }
                Err(e) => {
                    log::debug!("{} {index}: load failed, not cached: {e}", self.name);
                    slots.entries.remove(&index);
                }
            }
        }
        result
    }

    /// The resolved value for `index`, if loading already completed.
    pub fn cached(&self, index: usize) -> Option<T> {
        match self.slots.lock().entries.get(&index) {
            Some(Slot::Ready(value)) => Some(value.clone()),
            Some(Slot::Pending { load, .. }) => load.peek().and_then(|r| r.as_ref().ok()).cloned(),
            None => None,
        }
    }

    /// Whether a load for `index` is currently in flight.
    pub fn is_pending(&self, index: usize) -> bool {
        matches!(
            self.slots.lock().entries.get(&index),
            Some(Slot::Pending { load, .. }) if load.peek().is_none()
        )
    }
}
