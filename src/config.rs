//! Pool configuration options

use crate::hooks::LifecycleHooks;

/// Configuration applied when a pool is built with [`SharedPool::with_config`]
///
/// # Examples
///
/// ```
/// use shared_pool::PoolConfiguration;
///
/// let config = PoolConfiguration::<Vec<u8>>::new()
///     .with_initial_capacity(64)
///     .with_warmup(8)
///     .with_destroyer(|buf| buf.clear());
///
/// assert_eq!(config.initial_capacity, Some(64));
/// assert_eq!(config.warmup_size, Some(8));
/// ```
///
/// [`SharedPool::with_config`]: crate::SharedPool::with_config
#[derive(Debug)]
pub struct PoolConfiguration<T> {
    /// Initializer and destroyer installed on the pool
    pub hooks: LifecycleHooks<T>,

    /// Storage to reserve up front
    pub initial_capacity: Option<usize>,

    /// Number of objects to construct eagerly
    pub warmup_size: Option<usize>,
}

impl<T> Default for PoolConfiguration<T> {
    fn default() -> Self {
        Self {
            hooks: LifecycleHooks::default(),
            initial_capacity: None,
            warmup_size: None,
        }
    }
}

impl<T> Clone for PoolConfiguration<T> {
    fn clone(&self) -> Self {
        Self {
            hooks: self.hooks.clone(),
            initial_capacity: self.initial_capacity,
            warmup_size: self.warmup_size,
        }
    }
}

impl<T> PoolConfiguration<T> {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set both lifecycle hooks
    pub fn with_hooks(mut self, hooks: LifecycleHooks<T>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Set the hook run on every acquired object
    pub fn with_initializer<I>(mut self, initializer: I) -> Self
    where
        I: Fn(&mut T) + Send + Sync + 'static,
    {
        self.hooks = self.hooks.with_initializer(initializer);
        self
    }

    /// Set the hook run on every returned object
    pub fn with_destroyer<D>(mut self, destroyer: D) -> Self
    where
        D: Fn(&mut T) + Send + Sync + 'static,
    {
        self.hooks = self.hooks.with_destroyer(destroyer);
        self
    }

    /// Reserve storage for `capacity` objects on creation
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = Some(capacity);
        self
    }

    /// Construct `size` objects on creation
    pub fn with_warmup(mut self, size: usize) -> Self {
        self.warmup_size = Some(size);
        self
    }
}
