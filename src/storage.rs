//! Bookkeeping for allocated and idle objects

use std::collections::HashSet;
use std::fmt;

/// Stable identity of an object for the whole time it belongs to a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Raw numeric value, unique within one pool
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An object owned by a pool, boxed so moves never relocate it
pub(crate) struct Pooled<T> {
    pub(crate) id: ObjectId,
    pub(crate) object: Box<T>,
}

/// `allocated` tracks every live object the pool built, `available` the idle
/// subset. Ids in `available` always appear in `allocated`.
pub(crate) struct ObjectStorage<T> {
    allocated: Vec<ObjectId>,
    available: Vec<Pooled<T>>,
    next_id: u64,
}

impl<T> ObjectStorage<T> {
    pub fn new() -> Self {
        Self {
            allocated: Vec::new(),
            available: Vec::new(),
            next_id: 0,
        }
    }

    pub fn allocated_len(&self) -> usize {
        self.allocated.len()
    }

    pub fn available_len(&self) -> usize {
        self.available.len()
    }

    pub fn capacity(&self) -> usize {
        self.allocated.capacity()
    }

    /// Make room for `total` objects in both collections
    pub fn reserve(&mut self, total: usize) {
        if total <= self.allocated.len() {
            return;
        }
        self.allocated.reserve(total - self.allocated.len());
        self.available.reserve(total - self.available.len());
    }

    /// Record a freshly built object and return it with its new id
    pub fn adopt(&mut self, object: Box<T>) -> Pooled<T> {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.allocated.push(id);
        Pooled { id, object }
    }

    /// Prepare the most recently returned object in place, then take it out
    ///
    /// The object stays in `available` until `prepare` returns, so a panic in
    /// `prepare` does not lose it.
    pub fn take_available(&mut self, prepare: impl FnOnce(&mut T)) -> Option<Pooled<T>> {
        let last = self.available.last_mut()?;
        prepare(&mut last.object);
        self.available.pop()
    }

    pub fn put_available(&mut self, pooled: Pooled<T>) {
        debug_assert!(self.allocated.contains(&pooled.id));
        self.available.push(pooled);
    }

    /// Take every idle object out and forget its id
    ///
    /// The objects are handed back to the caller so they can be dropped
    /// outside the pool lock.
    pub fn purge_available(&mut self) -> Vec<Pooled<T>> {
        let purged: Vec<Pooled<T>> = self.available.drain(..).collect();
        let ids: HashSet<ObjectId> = purged.iter().map(|pooled| pooled.id).collect();
        self.allocated.retain(|id| !ids.contains(id));
        purged
    }

    #[cfg(test)]
    pub fn available_ids(&self) -> Vec<ObjectId> {
        self.available.iter().map(|pooled| pooled.id).collect()
    }
}

impl<T> Default for ObjectStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}
