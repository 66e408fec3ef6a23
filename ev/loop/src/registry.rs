//! Subscription registry
//!
//! Subscriptions live in an arena; their index doubles as the handle stored
//! in back references and in the waiting queue. An ordered map from object
//! identity to the per-direction indices gives O(log n) lookup on
//! subscribe and unsubscribe.

use std::collections::BTreeMap;
use std::sync::Arc;

use ev_core::{Direction, Progress, Violation};

use crate::link::{ObjectId, Readiness};
use crate::slab::Slab;

pub(crate) type Callback = Box<dyn FnMut() -> Progress + Send + 'static>;

pub(crate) struct Subscription {
    pub(crate) object: Arc<dyn Readiness>,
    pub(crate) direction: Direction,
    pub(crate) callback: Option<Callback>,
}

#[derive(Default)]
pub(crate) struct Registry {
    subscriptions: Slab<Subscription>,
    by_object: BTreeMap<ObjectId, [Option<usize>; 2]>,
}

impl Registry {
    /// Register a subscription for (object, direction).
    pub(crate) fn insert(
        &mut self,
        object: Arc<dyn Readiness>,
        direction: Direction,
        callback: Callback,
    ) -> Result<usize, Violation> {
        let id = object.link().id();
        let slots = self.by_object.entry(id).or_insert([None, None]);
        if slots[direction.index()].is_some() {
            return Err(Violation::DuplicateSubscription {
                object: id.raw(),
                direction,
            });
        }

        let index = self.subscriptions.insert(Subscription {
            object,
            direction,
            callback: Some(callback),
        });
        slots[direction.index()] = Some(index);
        Ok(index)
    }

    /// Remove a single subscription by index.
    pub(crate) fn remove(&mut self, index: usize) -> Option<Subscription> {
        let subscription = self.subscriptions.remove(index)?;
        let id = subscription.object.link().id();
        if let Some(slots) = self.by_object.get_mut(&id) {
            slots[subscription.direction.index()] = None;
            if slots.iter().all(Option::is_none) {
                self.by_object.remove(&id);
            }
        }
        Some(subscription)
    }

    /// Remove every subscription of `object`, `In` first.
    pub(crate) fn remove_object(&mut self, id: ObjectId) -> Option<Vec<(usize, Subscription)>> {
        let slots = self.by_object.remove(&id)?;
        let removed = slots
            .into_iter()
            .flatten()
            .filter_map(|index| Some((index, self.subscriptions.remove(index)?)))
            .collect();
        Some(removed)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Subscription> {
        self.subscriptions.get_mut(index)
    }

    pub(crate) fn index(&self, id: ObjectId, direction: Direction) -> Option<usize> {
        self.by_object.get(&id)?[direction.index()]
    }

    pub(crate) fn contains(&self, id: ObjectId, direction: Direction) -> bool {
        self.index(id, direction).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}
