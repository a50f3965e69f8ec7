mod common;

use interlock::sync::{Mode, SharedLock, SharedMutex};
use interlock::task;
use interlock::time::sleep;

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};
use std::time::Duration;

fn poll_once<F: Future + Unpin>(future: &mut F) -> Poll<F::Output> {
    Pin::new(future).poll(&mut Context::from_waker(Waker::noop()))
}

fn ready<F: Future + Unpin>(future: &mut F) -> F::Output {
    match poll_once(future) {
        Poll::Ready(output) => output,
        Poll::Pending => panic!("expected the request to be granted"),
    }
}

#[test]
fn test_three_shared_locks_block_exclusive_until_released() {
    let mutex = SharedMutex::new();

    let locks: Vec<SharedLock> = (0..3)
        .map(|_| mutex.acquire_shared_lock_immediate().expect("shared lock"))
        .collect();

    assert!(locks.iter().all(SharedLock::shared));
    assert_eq!(mutex.active(), 3);

    for lock in &locks {
        assert!(mutex.acquire_exclusive_lock_immediate().is_none());
        assert!(lock.release());
    }

    let exclusive = mutex
        .acquire_exclusive_lock_immediate()
        .expect("exclusive lock after every shared lock was released");

    assert!(!exclusive.shared());
    assert_eq!(mutex.mode(), Mode::Exclusive);
}

#[test]
fn test_immediate_acquisition_follows_mode() {
    let mutex = SharedMutex::new();
    assert_eq!(mutex.mode(), Mode::Free);

    let r1 = mutex.acquire_shared_lock_immediate().unwrap();
    assert_eq!(mutex.mode(), Mode::Shared);
    assert!(mutex.acquire_exclusive_lock_immediate().is_none());

    let r2 = mutex.acquire_shared_lock_immediate().unwrap();
    drop(r1);
    assert_eq!(mutex.mode(), Mode::Shared);
    drop(r2);
    assert_eq!(mutex.mode(), Mode::Free);

    let w = mutex.acquire_exclusive_lock_immediate().unwrap();
    assert_eq!(mutex.mode(), Mode::Exclusive);
    assert!(mutex.acquire_shared_lock_immediate().is_none());
    assert!(mutex.acquire_exclusive_lock_immediate().is_none());

    drop(w);
    assert_eq!(mutex.mode(), Mode::Free);
    assert_eq!(mutex.active(), 0);
}

#[test]
fn test_release_is_idempotent() {
    let mutex = SharedMutex::new();

    let first = mutex.acquire_exclusive_lock_immediate().unwrap();
    assert!(first.release());
    assert!(!first.release());

    // A stale handle cannot release the lock that replaced it.
    let second = mutex.acquire_exclusive_lock_immediate().unwrap();
    assert!(!first.release());
    drop(first);
    assert_eq!(mutex.mode(), Mode::Exclusive);
    assert_eq!(mutex.active(), 1);

    assert!(second.release());
    assert_eq!(mutex.mode(), Mode::Free);
}

#[test]
fn test_queued_exclusive_reserves_mode() {
    let mutex = SharedMutex::new();
    let reader = mutex.acquire_shared_lock_immediate().unwrap();

    let mut writer = mutex.acquire_exclusive_lock();
    assert!(!writer.shared());
    assert_eq!(mutex.mode(), Mode::Exclusive);
    assert_eq!(mutex.waiting(), 1);

    // Late readers no longer join the current batch.
    assert!(mutex.acquire_shared_lock_immediate().is_none());
    assert!(poll_once(&mut writer).is_pending());

    drop(reader);
    assert_eq!(mutex.waiting(), 0);
    assert_eq!(mutex.active(), 1);

    let lock = ready(&mut writer);
    assert!(!lock.shared());
    assert_eq!(mutex.mode(), Mode::Exclusive);

    drop(lock);
    assert_eq!(mutex.mode(), Mode::Free);
}

#[test]
fn test_waiters_activate_in_order_with_shared_batching() {
    let mutex = SharedMutex::new();
    let gate = mutex.acquire_exclusive_lock_immediate().unwrap();

    let mut s1 = mutex.acquire_shared_lock();
    let mut s2 = mutex.acquire_shared_lock();
    let mut x = mutex.acquire_exclusive_lock();
    let mut s3 = mutex.acquire_shared_lock();
    assert_eq!(mutex.waiting(), 4);

    drop(gate);

    // Both leading readers are let in together.
    assert_eq!(mutex.active(), 2);
    assert_eq!(mutex.waiting(), 2);
    assert_eq!(mutex.mode(), Mode::Exclusive);

    let l1 = ready(&mut s1);
    let l2 = ready(&mut s2);
    assert!(poll_once(&mut x).is_pending());
    assert!(poll_once(&mut s3).is_pending());

    drop(l1);
    assert!(poll_once(&mut x).is_pending());
    drop(l2);

    let lx = ready(&mut x);
    assert!(poll_once(&mut s3).is_pending());
    drop(lx);

    let l3 = ready(&mut s3);
    assert_eq!(mutex.mode(), Mode::Shared);
    assert_eq!(mutex.waiting(), 0);
    drop(l3);

    assert_eq!(mutex.mode(), Mode::Free);
}

#[test]
fn test_clones_share_one_lock() {
    let mutex = SharedMutex::default();
    let other = mutex.clone();

    let lock = mutex.acquire_exclusive_lock_immediate().unwrap();
    assert_eq!(other.mode(), Mode::Exclusive);
    assert!(other.acquire_shared_lock_immediate().is_none());

    drop(lock);
    assert!(other.acquire_shared_lock_immediate().is_some());
}

#[interlock::test(worker_threads = 4)]
async fn test_run_shared_returns_task_output() {
    common::init_tracing();

    let mutex = SharedMutex::new();
    let probe = mutex.clone();

    let value = mutex
        .run_shared(move || async move {
            assert_eq!(probe.mode(), Mode::Shared);
            assert!(probe.acquire_shared_lock_immediate().is_some());
            assert!(probe.acquire_exclusive_lock_immediate().is_none());
            21 * 2
        })
        .await;

    assert_eq!(value, 42);
    assert_eq!(mutex.mode(), Mode::Free);
}

#[interlock::test(worker_threads = 4)]
async fn test_tasks_observe_arrival_order() {
    common::init_tracing();

    let mutex = SharedMutex::new();
    let gate = mutex.acquire_exclusive_lock_immediate().unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));

    // Requests join the queue here, in this order.
    let requests = vec![
        ("s1", mutex.acquire_shared_lock()),
        ("s2", mutex.acquire_shared_lock()),
        ("x1", mutex.acquire_exclusive_lock()),
        ("s3", mutex.acquire_shared_lock()),
        ("s4", mutex.acquire_shared_lock()),
        ("x2", mutex.acquire_exclusive_lock()),
    ];

    let handles: Vec<_> = requests
        .into_iter()
        .map(|(name, request)| {
            let log = log.clone();
            let mutex = mutex.clone();

            task::spawn(async move {
                let lock = request.await;

                if !lock.shared() {
                    assert_eq!(mutex.active(), 1);
                }

                log.lock().unwrap().push(name);
                sleep(Duration::from_millis(5)).await;
                lock.release();
            })
        })
        .collect();

    sleep(Duration::from_millis(10)).await;
    assert!(log.lock().unwrap().is_empty());
    drop(gate);

    for handle in handles {
        handle.await.unwrap();
    }

    let log = log.lock().unwrap();
    let mut batches: Vec<Vec<&str>> = vec![log[0..2].to_vec(), log[3..5].to_vec()];
    batches.iter_mut().for_each(|batch| batch.sort_unstable());

    assert_eq!(batches, [vec!["s1", "s2"], vec!["s3", "s4"]]);
    assert_eq!(log[2], "x1");
    assert_eq!(log[5], "x2");
}
