//! Move-only handle to a checked-out object

use crate::errors::{PoolError, PoolResult};
use crate::hooks::Destroyer;
use crate::pool::SharedPool;
use crate::storage::{ObjectId, Pooled};

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Weak;
use tracing::debug;

/// Exclusive access to one pooled object
///
/// Dropping the handle gives the object back to the pool it came from. The
/// handle only holds a weak reference to that pool; if the pool is already
/// gone, the destroyer captured at acquisition runs on the object and the
/// object is dropped.
///
/// Handles cannot be cloned. Assigning over a handle releases the object it
/// held first, to that object's own pool:
///
/// ```
/// use shared_pool::SharedPool;
///
/// let first = SharedPool::create(|| String::from("Pool1"));
/// let second = SharedPool::create(|| String::from("Pool2"));
///
/// let mut handle = first.acquire().unwrap();
/// assert_eq!(*handle, "Pool1");
/// assert_eq!(first.available(), 0);
///
/// handle = second.acquire().unwrap();
/// assert_eq!(*handle, "Pool2");
/// assert_eq!(first.available(), 1);
///
/// drop(handle);
/// assert_eq!(second.available(), 1);
/// ```
pub struct Handle<T> {
    pool: Weak<SharedPool<T>>,
    object: Option<Pooled<T>>,
    destroyer: Destroyer<T>,
}

impl<T> Handle<T> {
    pub(crate) fn new(
        pool: Weak<SharedPool<T>>,
        mut pooled: Pooled<T>,
        destroyer: Destroyer<T>,
    ) -> PoolResult<Self> {
        if pool.strong_count() == 0 {
            destroyer(&mut *pooled.object);
            return Err(PoolError::PoolExpired);
        }

        Ok(Self {
            pool,
            object: Some(pooled),
            destroyer,
        })
    }

    /// Whether the handle still owns an object
    pub fn is_owning(&self) -> bool {
        self.object.is_some()
    }

    /// Identity of the owned object
    pub fn id(&self) -> Option<ObjectId> {
        self.object.as_ref().map(|pooled| pooled.id)
    }

    /// Shared access to the owned object, `None` once released
    pub fn get(&self) -> Option<&T> {
        self.object.as_ref().map(|pooled| &*pooled.object)
    }

    /// Exclusive access to the owned object, `None` once released
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.object.as_mut().map(|pooled| &mut *pooled.object)
    }

    /// Give the object back now instead of on drop
    ///
    /// The handle is empty afterwards; releasing again does nothing.
    pub fn release(&mut self) {
        let Some(mut pooled) = self.object.take() else {
            return;
        };

        match self.pool.upgrade() {
            Some(pool) => pool.release(pooled),
            None => {
                debug!(object_id = %pooled.id, "pool dropped before handle, destroying object");
                (self.destroyer)(&mut *pooled.object);
            }
        }
    }
}

impl<T> Deref for Handle<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.get().expect("handle has been released")
    }
}

impl<T> DerefMut for Handle<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.get_mut().expect("handle has been released")
    }
}

impl<T> Drop for Handle<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: fmt::Debug> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("id", &self.id())
            .field("object", &self.get())
            .finish()
    }
}
