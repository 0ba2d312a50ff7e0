use elastic_pool::ThreadPool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

fn main() {
    let now = Instant::now();
    let pool = ThreadPool::with_hardware_threads();
    let counter = Arc::new(AtomicUsize::new(0));

    for _ in 0..1_000_000 {
        let c = counter.clone();
        pool.push(move || {
            c.fetch_add(1, Ordering::Relaxed);
        });
    }
    pool.wait();

    println!(
        "workers: {}, tasks: {}, elapsed: {:?}",
        pool.size(),
        counter.load(Ordering::Relaxed),
        now.elapsed()
    );
}
