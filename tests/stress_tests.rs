//! Stress tests to verify the primitives under contention

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use furry_core::sync::FlagWait;
use furry_core::{
    thread, MessageQueue, Mutex, MutexType, Semaphore, ThreadBuilder, Timeout,
};

/// Stress test: many threads incrementing a counter under one mutex
#[test]
fn stress_test_mutex_contention() {
    println!("\n=== STRESS TEST: Mutex Contention ===");
    let thread_count = 8;
    let iterations = 2000;
    let mutex = Arc::new(Mutex::new(MutexType::Normal));
    let inside = Arc::new(AtomicUsize::new(0));
    let total = Arc::new(AtomicUsize::new(0));

    let start = Instant::now();
    let handles: Vec<_> = (0..thread_count)
        .map(|i| {
            let mutex = mutex.clone();
            let inside = inside.clone();
            let total = total.clone();
            ThreadBuilder::new()
                .name(format!("contender-{i}"))
                .spawn(move || {
                    for _ in 0..iterations {
                        let _guard = mutex.lock(Timeout::FOREVER).unwrap();
                        assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0, "two owners at once");
                        total.fetch_add(1, Ordering::Relaxed);
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                })
                .unwrap()
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    println!("Time: {:?}", start.elapsed());
    assert_eq!(total.load(Ordering::Relaxed), thread_count * iterations);
    assert_eq!(mutex.owner(), None);
}

/// Stress test: producers and one consumer through a small queue
#[test]
fn stress_test_queue_producers() {
    println!("\n=== STRESS TEST: Message Queue Producers ===");
    let producers = 4;
    let per_producer = 5000u32;
    let queue = Arc::new(MessageQueue::<(usize, u32)>::new(4));

    let handles: Vec<_> = (0..producers)
        .map(|p| {
            let queue = queue.clone();
            std::thread::spawn(move || {
                for seq in 0..per_producer {
                    queue.put((p, seq), Timeout::FOREVER).unwrap();
                }
            })
        })
        .collect();

    // Per producer the sequence numbers must arrive in order.
    let mut next = vec![0u32; producers];
    for _ in 0..producers * per_producer as usize {
        let (p, seq) = queue.get(Timeout::from_millis(5000)).unwrap();
        assert_eq!(seq, next[p], "producer {p} reordered");
        next[p] += 1;
    }

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(queue.count(), 0);
    assert!(next.iter().all(|&n| n == per_producer));
}

/// Stress test: semaphore never hands out more than its count
#[test]
fn stress_test_semaphore_pool() {
    println!("\n=== STRESS TEST: Semaphore Pool ===");
    let slots = 3;
    let semaphore = Arc::new(Semaphore::new(slots, slots));
    let in_use = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let semaphore = semaphore.clone();
            let in_use = in_use.clone();
            let peak = peak.clone();
            std::thread::spawn(move || {
                for _ in 0..500 {
                    semaphore.acquire(Timeout::FOREVER).unwrap();
                    let now = in_use.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    thread::yield_now();
                    in_use.fetch_sub(1, Ordering::SeqCst);
                    semaphore.release().unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    println!("Peak concurrent holders: {}", peak.load(Ordering::SeqCst));
    assert!(peak.load(Ordering::SeqCst) <= slots as usize);
    assert_eq!(semaphore.count(), slots);
}

/// Stress test: stop-bit shutdown of a pool of workers
#[test]
fn stress_test_stop_bit_shutdown() {
    println!("\n=== STRESS TEST: Stop Bit Shutdown ===");
    const WORK: u32 = 1 << 0;
    const STOP: u32 = 1 << 1;
    let done = Arc::new(AtomicUsize::new(0));

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let done = done.clone();
            ThreadBuilder::new()
                .spawn(move || loop {
                    let bits = thread::flags_wait(WORK | STOP, FlagWait::ANY, Timeout::FOREVER).unwrap();
                    if bits & WORK != 0 {
                        done.fetch_add(1, Ordering::SeqCst);
                    }
                    if bits & STOP != 0 {
                        break;
                    }
                })
                .unwrap()
        })
        .collect();

    for worker in &workers {
        worker.thread().flags_set(WORK);
    }
    while done.load(Ordering::SeqCst) < workers.len() {
        thread::yield_now();
    }
    for worker in &workers {
        worker.thread().flags_set(STOP);
    }
    for worker in workers {
        worker.join().unwrap();
    }
    assert_eq!(done.load(Ordering::SeqCst), 4);
}
