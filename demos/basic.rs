//! Basic usage examples for SharedPool

use shared_pool::{Creator, PoolConfiguration, SharedPool};
use std::sync::Arc;
use std::thread;

#[derive(Debug)]
struct ComplexObject {
    name: String,
    state: String,
}

impl From<&str> for ComplexObject {
    fn from(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: "new".to_string(),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== SharedPool - Basic Examples ===\n");

    // Example 1: Simple pool
    simple_pool();

    // Example 2: Lifecycle hooks
    hooks();

    // Example 3: Handles across pools
    cross_pool_handles();

    // Example 4: Threads and metrics
    threads_and_metrics();
}

fn simple_pool() {
    println!("1. Simple Pool:");
    let pool = SharedPool::create(|| String::from("default"));

    {
        let mut obj = pool.acquire().unwrap();
        obj.push_str(" (in use)");
        println!("   Got object: {}", *obj);
        println!("   Size: {}, available: {}", pool.size(), pool.available());
    }

    println!("   Available after return: {}\n", pool.available());
}

fn hooks() {
    println!("2. Lifecycle Hooks:");
    let pool = SharedPool::<ComplexObject>::create_from("Complex");
    pool.set_methods(
        |obj| obj.state = "initialized".to_string(),
        |obj| obj.state = "destroyed".to_string(),
    );

    {
        let obj = pool.acquire().unwrap();
        println!("   {} is {}", obj.name, obj.state);
    }

    let config = PoolConfiguration::new()
        .with_warmup(3)
        .with_destroyer(|buf: &mut Vec<u8>| buf.clear());
    let buffers =
        SharedPool::with_config(Creator::from_fn(|| Vec::with_capacity(1024)), config).unwrap();
    println!("   Warmed up buffer pool: size {}\n", buffers.size());
}

fn cross_pool_handles() {
    println!("3. Handles Across Pools:");
    let pool1 = SharedPool::create(|| String::from("Pool1"));
    let pool2 = SharedPool::create(|| String::from("Pool2"));

    let mut handle = pool1.acquire().unwrap();
    println!("   Holding: {}", *handle);

    handle = pool2.acquire().unwrap();
    println!("   Now holding: {}", *handle);
    println!("   Pool1 available: {}, Pool2 available: {}", pool1.available(), pool2.available());

    drop(pool2);
    drop(handle);
    println!("   Handle outlived its pool and cleaned up after itself\n");
}

fn threads_and_metrics() {
    println!("4. Threads and Metrics:");
    let pool = SharedPool::create(|| String::with_capacity(64));

    let workers: Vec<_> = (0..5)
        .map(|id| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                for i in 0..100 {
                    let mut handle = pool.acquire().unwrap();
                    handle.clear();
                    handle.push_str(&format!("worker {id} iteration {i}"));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let metrics = pool.export_metrics();
    println!("   Metrics:");
    for (key, value) in metrics {
        println!("     {}: {}", key, value);
    }
}
