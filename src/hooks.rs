//! Lifecycle hooks run when objects leave and re-enter the pool

use std::fmt;
use std::sync::Arc;

/// Runs on an object right before it is handed out by `acquire`
pub type Initializer<T> = Arc<dyn Fn(&mut T) + Send + Sync>;

/// Runs on an object when its handle gives it back
pub type Destroyer<T> = Arc<dyn Fn(&mut T) + Send + Sync>;

/// Initializer and destroyer pair owned by a pool
///
/// Both hooks default to no-ops.
///
/// # Examples
///
/// ```
/// use shared_pool::LifecycleHooks;
///
/// let hooks = LifecycleHooks::new(|buf: &mut Vec<u8>| buf.reserve(64), |buf| buf.clear());
///
/// let mut buf = vec![1, 2, 3];
/// hooks.destroy(&mut buf);
/// assert!(buf.is_empty());
/// ```
pub struct LifecycleHooks<T> {
    pub(crate) initializer: Initializer<T>,
    pub(crate) destroyer: Destroyer<T>,
}

impl<T> LifecycleHooks<T> {
    /// Create a hook pair from two closures
    pub fn new<I, D>(initializer: I, destroyer: D) -> Self
    where
        I: Fn(&mut T) + Send + Sync + 'static,
        D: Fn(&mut T) + Send + Sync + 'static,
    {
        Self {
            initializer: Arc::new(initializer),
            destroyer: Arc::new(destroyer),
        }
    }

    /// Replace only the initializer
    pub fn with_initializer<I>(mut self, initializer: I) -> Self
    where
        I: Fn(&mut T) + Send + Sync + 'static,
    {
        self.initializer = Arc::new(initializer);
        self
    }

    /// Replace only the destroyer
    pub fn with_destroyer<D>(mut self, destroyer: D) -> Self
    where
        D: Fn(&mut T) + Send + Sync + 'static,
    {
        self.destroyer = Arc::new(destroyer);
        self
    }

    /// Run the initializer on `object`
    pub fn initialize(&self, object: &mut T) {
        (self.initializer)(object);
    }

    /// Run the destroyer on `object`
    pub fn destroy(&self, object: &mut T) {
        (self.destroyer)(object);
    }

    pub(crate) fn destroyer(&self) -> Destroyer<T> {
        Arc::clone(&self.destroyer)
    }
}

impl<T> Default for LifecycleHooks<T> {
    fn default() -> Self {
        Self::new(|_| {}, |_| {})
    }
}

impl<T> Clone for LifecycleHooks<T> {
    fn clone(&self) -> Self {
        Self {
            initializer: Arc::clone(&self.initializer),
            destroyer: Arc::clone(&self.destroyer),
        }
    }
}

impl<T> fmt::Debug for LifecycleHooks<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleHooks").finish_non_exhaustive()
    }
}
