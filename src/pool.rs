//! The shared pool coordinator

use crate::config::PoolConfiguration;
use crate::creator::Creator;
use crate::errors::{BoxError, PoolError, PoolResult};
use crate::handle::Handle;
use crate::hooks::LifecycleHooks;
use crate::metrics::{MetricsTracker, PoolMetrics};
use crate::storage::{ObjectStorage, Pooled};

#[cfg(feature = "metrics")]
use crate::metrics::MetricsExporter;

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, trace, warn};

struct PoolState<T> {
    storage: ObjectStorage<T>,
    hooks: LifecycleHooks<T>,
}

/// Thread-safe, unbounded pool of `T`
///
/// A pool only exists behind an `Arc`; clone the `Arc` to share it between
/// threads. [`acquire`](Self::acquire) reuses the most recently returned idle
/// object or builds a new one, so it never waits.
///
/// All bookkeeping, object construction and hook calls happen under one
/// mutex. Hooks and factories must not call back into the same pool, and
/// must not drop handles that belong to it.
///
/// # Examples
///
/// ```
/// use shared_pool::SharedPool;
///
/// let pool = SharedPool::create(|| String::from("default"));
///
/// {
///     let mut handle = pool.acquire().unwrap();
///     handle.push_str("-used");
///     assert_eq!(pool.size(), 1);
///     assert_eq!(pool.available(), 0);
/// }
///
/// assert_eq!(pool.available(), 1);
/// ```
pub struct SharedPool<T> {
    state: Mutex<PoolState<T>>,
    creator: Creator<T>,
    metrics: MetricsTracker,
    this: Weak<SharedPool<T>>,
}

impl<T: Send + 'static> SharedPool<T> {
    fn from_parts(creator: Creator<T>, hooks: LifecycleHooks<T>) -> Arc<Self> {
        let pool = Arc::new_cyclic(|this| Self {
            state: Mutex::new(PoolState {
                storage: ObjectStorage::new(),
                hooks,
            }),
            creator,
            metrics: MetricsTracker::new(),
            this: this.clone(),
        });
        debug!(object_type = std::any::type_name::<T>(), "shared pool created");
        pool
    }

    /// Create a pool that builds objects with `factory`
    pub fn create<F>(factory: F) -> Arc<Self>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::from_parts(Creator::from_fn(factory), LifecycleHooks::default())
    }

    /// Create a pool whose factory may fail
    ///
    /// Failures surface from [`acquire`](Self::acquire) and
    /// [`prepare`](Self::prepare) as [`PoolError::Construction`].
    pub fn try_create<F, E>(factory: F) -> Arc<Self>
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self::from_parts(Creator::try_from_fn(factory), LifecycleHooks::default())
    }

    /// Create a pool that builds every object from a clone of `args`
    ///
    /// # Examples
    ///
    /// ```
    /// use shared_pool::SharedPool;
    ///
    /// let pool = SharedPool::<String>::create_from("Args1");
    /// assert_eq!(*pool.acquire().unwrap(), "Args1");
    /// ```
    pub fn create_from<A>(args: A) -> Arc<Self>
    where
        A: Clone + Send + Sync + 'static,
        T: From<A>,
    {
        Self::from_parts(Creator::from_args(args), LifecycleHooks::default())
    }

    /// Create a pool of `T::default()` objects
    pub fn create_default() -> Arc<Self>
    where
        T: Default,
    {
        Self::from_parts(Creator::default(), LifecycleHooks::default())
    }

    /// Create a pool with lifecycle hooks installed
    ///
    /// # Examples
    ///
    /// ```
    /// use shared_pool::SharedPool;
    ///
    /// let pool = SharedPool::create_with_methods(
    ///     |s: &mut String| s.push_str(" initialized"),
    ///     |s: &mut String| s.truncate(7),
    ///     || String::from("Complex"),
    /// );
    ///
    /// let handle = pool.acquire().unwrap();
    /// assert_eq!(*handle, "Complex initialized");
    /// ```
    pub fn create_with_methods<I, D, F>(initializer: I, destroyer: D, factory: F) -> Arc<Self>
    where
        I: Fn(&mut T) + Send + Sync + 'static,
        D: Fn(&mut T) + Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::from_parts(Creator::from_fn(factory), LifecycleHooks::new(initializer, destroyer))
    }

    /// Create a pool from an explicit creator and configuration
    ///
    /// Hooks are installed first, then storage is reserved and the warm-up
    /// objects are built.
    pub fn with_config(
        creator: Creator<T>,
        config: PoolConfiguration<T>,
    ) -> PoolResult<Arc<Self>> {
        let pool = Self::from_parts(creator, config.hooks);
        if let Some(capacity) = config.initial_capacity {
            pool.reserve(capacity);
        }
        if let Some(size) = config.warmup_size {
            pool.prepare(size)?;
        }
        Ok(pool)
    }

    /// Run [`prepare`](Self::prepare) on tokio's blocking thread pool
    pub async fn prepare_async(self: &Arc<Self>, n: usize) -> PoolResult<()> {
        let pool = Arc::clone(self);

        tokio::task::spawn_blocking(move || pool.prepare(n))
            .await
            .map_err(|_| PoolError::Cancelled)?
    }
}

impl<T> SharedPool<T> {
    /// Replace the initializer and destroyer
    ///
    /// Handles already checked out keep the destroyer they were acquired
    /// with for the case where they outlive the pool.
    pub fn set_methods<I, D>(&self, initializer: I, destroyer: D)
    where
        I: Fn(&mut T) + Send + Sync + 'static,
        D: Fn(&mut T) + Send + Sync + 'static,
    {
        self.set_hooks(LifecycleHooks::new(initializer, destroyer));
    }

    /// Replace both hooks at once
    pub fn set_hooks(&self, hooks: LifecycleHooks<T>) {
        self.state.lock().hooks = hooks;
    }

    /// Check out an object
    ///
    /// The most recently returned idle object is reused first. When none is
    /// idle a new object is built, so this only fails if the factory does.
    pub fn acquire(&self) -> PoolResult<Handle<T>> {
        let mut state = self.state.lock();
        let PoolState { storage, hooks } = &mut *state;

        let (pooled, reused) = match storage.take_available(|object| hooks.initialize(object)) {
            Some(pooled) => (pooled, true),
            None => {
                let mut object = Box::new(self.construct()?);
                hooks.initialize(&mut object);
                (storage.adopt(object), false)
            }
        };

        self.metrics.record_acquired(reused);
        trace!(object_id = %pooled.id, reused, "object acquired");
        Handle::new(self.this.clone(), pooled, hooks.destroyer())
    }

    /// Take back an object from a handle
    pub(crate) fn release(&self, mut pooled: Pooled<T>) {
        let mut state = self.state.lock();
        state.hooks.destroy(&mut pooled.object);
        trace!(object_id = %pooled.id, "object released");
        state.storage.put_available(pooled);
        self.metrics.record_released();
    }

    /// Reserve storage so `n` objects fit without reallocating
    pub fn reserve(&self, n: usize) {
        self.state.lock().storage.reserve(n);
    }

    /// Build idle objects until the pool holds at least `n`
    ///
    /// If the factory fails part way, the objects built so far stay in the
    /// pool and the error is returned.
    pub fn prepare(&self, n: usize) -> PoolResult<()> {
        let mut state = self.state.lock();
        let PoolState { storage, hooks } = &mut *state;

        let total = storage.allocated_len();
        if n <= total {
            return Ok(());
        }

        storage.reserve(n);
        for _ in total..n {
            let mut object = Box::new(self.construct()?);
            hooks.initialize(&mut object);
            let pooled = storage.adopt(object);
            storage.put_available(pooled);
        }

        debug!(built = n - total, size = n, "pool prepared");
        Ok(())
    }

    /// Drop every idle object and stop tracking it
    ///
    /// Checked-out objects are not affected. Returns the number of objects
    /// dropped. The objects are dropped after the pool lock is released, so
    /// an idle object may own handles from this same pool.
    pub fn purge(&self) -> usize {
        let purged = self.state.lock().storage.purge_available();
        let count = purged.len();
        drop(purged);
        debug!(purged = count, "idle objects purged");
        count
    }

    /// Number of objects the pool tracks, idle or checked out
    pub fn size(&self) -> usize {
        self.state.lock().storage.allocated_len()
    }

    /// Number of idle objects
    pub fn available(&self) -> usize {
        self.state.lock().storage.available_len()
    }

    /// Number of objects owned by live handles
    pub fn checked_out(&self) -> usize {
        let state = self.state.lock();
        state.storage.allocated_len() - state.storage.available_len()
    }

    /// Storage capacity of the allocated set
    pub fn capacity(&self) -> usize {
        self.state.lock().storage.capacity()
    }

    /// Get pool metrics
    pub fn metrics(&self) -> PoolMetrics {
        let state = self.state.lock();
        self.metrics.snapshot(
            state.storage.allocated_len(),
            state.storage.available_len(),
            state.storage.capacity(),
        )
    }

    /// Export metrics
    pub fn export_metrics(&self) -> HashMap<String, String> {
        self.metrics().export()
    }

    /// Export metrics in Prometheus format
    #[cfg(feature = "metrics")]
    pub fn export_metrics_prometheus(
        &self,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> PoolResult<String> {
        MetricsExporter::export_prometheus(&self.metrics(), pool_name, tags)
    }

    fn construct(&self) -> PoolResult<T> {
        match self.creator.create() {
            Ok(object) => {
                self.metrics.record_created();
                Ok(object)
            }
            Err(err) => {
                self.metrics.record_construction_failure();
                warn!(error = %err, "object construction failed");
                Err(err)
            }
        }
    }
}

impl<T> fmt::Debug for SharedPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SharedPool")
            .field("size", &state.storage.allocated_len())
            .field("available", &state.storage.available_len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct TestObject {
        data: String,
    }

    impl TestObject {
        fn new(data: &str) -> Self {
            Self {
                data: data.to_string(),
            }
        }
    }

    impl From<&str> for TestObject {
        fn from(data: &str) -> Self {
            Self::new(data)
        }
    }

    #[test]
    fn test_single_object_lifecycle() {
        let pool = SharedPool::create(|| TestObject::new("default"));

        let handle = pool.acquire().unwrap();
        let id = handle.id().unwrap();
        assert_eq!(pool.size(), 1);
        assert_eq!(pool.available(), 0);

        drop(handle);
        assert_eq!(pool.size(), 1);
        assert_eq!(pool.available(), 1);

        let handle = pool.acquire().unwrap();
        assert_eq!(handle.id(), Some(id));
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_reuse_is_lifo() {
        let pool = SharedPool::create(|| TestObject::new("default"));

        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        let (a_id, b_id) = (a.id().unwrap(), b.id().unwrap());

        drop(a);
        drop(b);

        let first = pool.acquire().unwrap();
        let second = pool.acquire().unwrap();
        assert_eq!(first.id(), Some(b_id));
        assert_eq!(second.id(), Some(a_id));
        assert_eq!(pool.size(), 2);
    }

    #[test]
    fn test_state_survives_reuse() {
        let pool = SharedPool::create(|| TestObject::new("default"));

        {
            let mut handle = pool.acquire().unwrap();
            handle.data = "Kebab".to_string();
        }

        assert_eq!(pool.acquire().unwrap().data, "Kebab");
    }

    #[test]
    fn test_hooks_run_on_acquire_and_release() {
        let pool = SharedPool::create_with_methods(
            |obj: &mut TestObject| obj.data.push_str("+init"),
            |obj: &mut TestObject| obj.data.push_str("+destroy"),
            || TestObject::new("obj"),
        );

        {
            let handle = pool.acquire().unwrap();
            assert_eq!(handle.data, "obj+init");
        }

        let handle = pool.acquire().unwrap();
        assert_eq!(handle.data, "obj+init+destroy+init");
    }

    #[test]
    fn test_set_methods_replaces_hooks() {
        let pool = SharedPool::<TestObject>::create_from("Args1");
        pool.set_methods(|obj| obj.data = "123".to_string(), |_| {});

        assert_eq!(pool.acquire().unwrap().data, "123");
    }

    #[test]
    fn test_prepare_is_idempotent() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let pool = SharedPool::create(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            TestObject::new("default")
        });

        let held: Vec<_> = (0..5).map(|_| pool.acquire().unwrap()).collect();
        assert_eq!(pool.size(), 5);

        pool.prepare(100).unwrap();
        assert_eq!(pool.size(), 100);
        assert_eq!(pool.available(), 95);
        assert_eq!(built.load(Ordering::SeqCst), 100);

        pool.prepare(100).unwrap();
        pool.prepare(10).unwrap();
        assert_eq!(built.load(Ordering::SeqCst), 100);

        drop(held);
        assert_eq!(pool.available(), 100);
    }

    #[test]
    fn test_prepare_runs_initializer() {
        let initialized = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&initialized);
        let pool = SharedPool::create_with_methods(
            move |_: &mut u32| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
            |_| {},
            || 0,
        );

        pool.prepare(3).unwrap();
        assert_eq!(initialized.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_reserve_grows_capacity_only() {
        let pool = SharedPool::create(|| 0u64);

        pool.reserve(32);
        assert!(pool.capacity() >= 32);
        assert_eq!(pool.size(), 0);
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_construction_failure_leaves_pool_consistent() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let pool = SharedPool::try_create(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 1 {
                Err("backend unavailable")
            } else {
                Ok(TestObject::new("ok"))
            }
        });

        let first = pool.acquire().unwrap();
        let err = pool.acquire().unwrap_err();
        assert!(matches!(err, PoolError::Construction(_)));
        assert_eq!(pool.size(), 1);
        assert_eq!(pool.available(), 0);
        assert_eq!(pool.metrics().construction_failures, 1);

        drop(first);
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn test_prepare_keeps_progress_on_failure() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let pool = SharedPool::try_create(move || {
            if counter.fetch_add(1, Ordering::SeqCst) >= 2 {
                Err("out of handles")
            } else {
                Ok(0u8)
            }
        });

        assert!(pool.prepare(5).is_err());
        assert_eq!(pool.size(), 2);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn test_panicking_initializer_does_not_lose_idle_object() {
        let pool = SharedPool::create(|| TestObject::new("default"));
        pool.prepare(1).unwrap();
        pool.set_methods(|_| panic!("initializer failed"), |_| {});

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| pool.acquire()));
        assert!(result.is_err());
        assert_eq!(pool.size(), 1);
        assert_eq!(pool.available(), 1);

        pool.set_hooks(LifecycleHooks::default());
        assert!(pool.acquire().is_ok());
    }

    #[test]
    fn test_panicking_initializer_on_growth_records_nothing() {
        let pool = SharedPool::create_with_methods(
            |_: &mut TestObject| panic!("initializer failed"),
            |_: &mut TestObject| {},
            || TestObject::new("fresh"),
        );

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| pool.acquire()));
        assert!(result.is_err());
        assert_eq!(pool.size(), 0);
        assert_eq!(pool.available(), 0);

        pool.set_hooks(LifecycleHooks::default());
        let handle = pool.acquire().unwrap();
        assert_eq!(handle.data, "fresh");
        assert_eq!(pool.size(), 1);
    }

    #[test]
    fn test_purge_drops_idle_object_holding_handle_from_same_pool() {
        struct Node {
            child: Option<Handle<Node>>,
        }

        let pool = SharedPool::create(|| Node { child: None });
        let child = pool.acquire().unwrap();
        let mut parent = pool.acquire().unwrap();
        parent.child = Some(child);
        drop(parent);
        assert_eq!(pool.size(), 2);
        assert_eq!(pool.available(), 1);

        let (tx, rx) = std::sync::mpsc::channel();
        let worker_pool = Arc::clone(&pool);
        std::thread::spawn(move || {
            let purged = worker_pool.purge();
            let _ = tx.send(purged);
        });

        let purged = rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("purge did not finish");
        assert_eq!(purged, 1);
        assert_eq!(pool.size(), 1);
        assert_eq!(pool.available(), 1);
        assert!(pool.acquire().unwrap().child.is_none());
    }

    #[test]
    fn test_purge_drops_idle_objects_only() {
        let pool = SharedPool::create(|| TestObject::new("default"));
        pool.prepare(4).unwrap();
        let held = pool.acquire().unwrap();

        assert_eq!(pool.purge(), 3);
        assert_eq!(pool.size(), 1);
        assert_eq!(pool.available(), 0);

        drop(held);
        assert_eq!(pool.size(), 1);
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn test_with_config_applies_capacity_and_warmup() {
        let config = PoolConfiguration::new()
            .with_initial_capacity(16)
            .with_warmup(4)
            .with_destroyer(|v: &mut Vec<u8>| v.clear());

        let pool = SharedPool::with_config(Creator::default(), config).unwrap();
        assert!(pool.capacity() >= 16);
        assert_eq!(pool.size(), 4);
        assert_eq!(pool.available(), 4);

        {
            let mut handle = pool.acquire().unwrap();
            handle.extend_from_slice(b"payload");
        }
        assert!(pool.acquire().unwrap().is_empty());
    }

    #[test]
    fn test_metrics_track_reuse() {
        let pool = SharedPool::create(|| 1u32);

        drop(pool.acquire().unwrap());
        drop(pool.acquire().unwrap());

        let metrics = pool.metrics();
        assert_eq!(metrics.total_acquired, 2);
        assert_eq!(metrics.total_released, 2);
        assert_eq!(metrics.total_created, 1);
        assert_eq!(metrics.reuse_hits, 1);
        assert_eq!(pool.export_metrics()["allocated"], "1");
    }

    #[tokio::test]
    async fn test_prepare_async() {
        let pool = SharedPool::create(|| TestObject::new("async"));

        pool.prepare_async(8).await.unwrap();
        assert_eq!(pool.size(), 8);
        assert_eq!(pool.available(), 8);
    }
}
