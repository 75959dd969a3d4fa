//! Deferred construction of pooled objects

use crate::errors::{BoxError, PoolError, PoolResult};

use std::fmt;
use std::sync::Arc;

type Factory<T> = Arc<dyn Fn() -> Result<T, BoxError> + Send + Sync>;

/// Zero-argument factory a pool calls whenever it needs a new object
///
/// Every object a pool builds comes from the same creator, so a pool is
/// homogeneous in how its objects are constructed.
///
/// # Examples
///
/// ```
/// use shared_pool::Creator;
///
/// let creator = Creator::<String>::from_args("Args1");
/// assert_eq!(creator.create().unwrap(), "Args1");
/// assert_eq!(creator.create().unwrap(), "Args1");
/// ```
pub struct Creator<T> {
    factory: Factory<T>,
}

impl<T: 'static> Creator<T> {
    /// Wrap an infallible factory
    pub fn from_fn<F>(factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(move || Ok(factory())),
        }
    }

    /// Wrap a factory that may fail
    pub fn try_from_fn<F, E>(factory: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self {
            factory: Arc::new(move || factory().map_err(Into::into)),
        }
    }

    /// Capture `args` once and build every object from a fresh clone of them
    pub fn from_args<A>(args: A) -> Self
    where
        A: Clone + Send + Sync + 'static,
        T: From<A>,
    {
        Self::from_fn(move || T::from(args.clone()))
    }
}

impl<T> Creator<T> {
    /// Build a new object
    pub fn create(&self) -> PoolResult<T> {
        (self.factory)().map_err(PoolError::Construction)
    }
}

impl<T: Default + 'static> Default for Creator<T> {
    fn default() -> Self {
        Self::from_fn(T::default)
    }
}

impl<T> Clone for Creator<T> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<T> fmt::Debug for Creator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Creator").finish_non_exhaustive()
    }
}
