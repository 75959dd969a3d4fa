//! # shared_pool
//!
//! Thread-safe, reference-counted object pool with move-only handles and
//! lifecycle hooks.
//!
//! ## Features
//!
//! - Pools live behind an `Arc` and can be shared freely between threads
//! - Unbounded: `acquire` reuses an idle object or builds a new one, it never waits
//! - Last-in-first-out reuse of idle objects
//! - Automatic return of objects via RAII (Drop trait)
//! - Handles hold only a weak reference, so they may outlive their pool
//! - Initializer and destroyer hooks run on checkout and check-in
//! - Deferred construction from a closure, a fallible factory or replayed arguments
//! - Pool warm-up/pre-population, also from async code
//! - Metrics with Prometheus export
//!
//! ## Quick Start
//!
//! ```rust
//! use shared_pool::SharedPool;
//!
//! let pool = SharedPool::create(|| String::from("default"));
//! {
//!     let mut obj = pool.acquire().unwrap();
//!     obj.push_str("-in-use");
//!     println!("Got: {}", *obj);
//!     // Object automatically returned when `obj` goes out of scope
//! }
//! assert_eq!(pool.available(), 1);
//! ```

mod config;
mod creator;
mod errors;
mod handle;
mod hooks;
mod metrics;
mod pool;
mod storage;

pub use config::PoolConfiguration;
pub use creator::Creator;
pub use errors::{BoxError, PoolError, PoolResult};
pub use handle::Handle;
pub use hooks::{Destroyer, Initializer, LifecycleHooks};
#[cfg(feature = "metrics")]
pub use metrics::MetricsExporter;
pub use metrics::PoolMetrics;
pub use pool::SharedPool;
pub use storage::ObjectId;
