mod common;

use interlock::sync::{Mode, Mutex, SharedMutex};
use interlock::task;
use interlock::time::{sleep, timeout};

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

#[interlock::test(worker_threads = 2)]
async fn test_timeout_withdraws_lock_request() {
    common::init_tracing();

    let mutex = Mutex::new();
    let held = mutex.acquire_lock().await;

    let result = timeout(Duration::from_millis(20), mutex.acquire_lock()).await;

    assert!(result.is_err());
    assert_eq!(mutex.waiting(), 0);

    drop(held);
    assert!(!mutex.is_locked());
}

#[interlock::test(worker_threads = 2)]
async fn test_timeout_returns_granted_lock() {
    let mutex = SharedMutex::new();

    let lock = timeout(Duration::from_millis(50), mutex.acquire_shared_lock())
        .await
        .expect("free mutex grants right away");

    assert!(lock.shared());
    assert_eq!(mutex.mode(), Mode::Shared);
}

#[interlock::test(worker_threads = 2)]
async fn test_abort_waiting_task_leaves_queue() {
    let mutex = Mutex::new();
    let held = mutex.acquire_lock_immediate().unwrap();

    let request = mutex.acquire_lock();
    let handle = task::spawn(async move {
        let _lock = request.await;
    });

    assert_eq!(mutex.waiting(), 1);

    handle.abort();
    let err = handle.await.unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(mutex.waiting(), 0);
    assert!(mutex.is_locked());

    drop(held);
    assert!(!mutex.is_locked());
}

#[interlock::test(worker_threads = 2)]
async fn test_abort_releases_held_lock() {
    let mutex = Mutex::new();

    let handle = task::spawn(mutex.run_exclusive(|| sleep(Duration::from_secs(10))));
    assert!(mutex.is_locked());

    sleep(Duration::from_millis(10)).await;
    handle.abort();

    assert!(handle.await.unwrap_err().is_cancelled());
    assert!(!mutex.is_locked());
}

#[interlock::test(worker_threads = 4)]
async fn test_cancelled_waiter_keeps_queue_order() {
    let mutex = Mutex::new();
    let gate = mutex.acquire_lock_immediate().unwrap();
    let order = Arc::new(StdMutex::new(Vec::new()));

    let push = |n: u32| {
        let order = order.clone();
        move || async move { order.lock().unwrap().push(n) }
    };

    let first = task::spawn(mutex.run_exclusive(push(1)));
    let withdrawn = mutex.acquire_lock();
    let third = task::spawn(mutex.run_exclusive(push(3)));

    assert_eq!(mutex.waiting(), 3);
    drop(withdrawn);
    assert_eq!(mutex.waiting(), 2);

    drop(gate);

    first.await.unwrap();
    third.await.unwrap();

    assert_eq!(*order.lock().unwrap(), [1, 3]);
}

#[test]
fn test_withdrawn_writer_admits_readers_behind_it() {
    let mutex = SharedMutex::new();
    let reader = mutex.acquire_shared_lock_immediate().unwrap();

    let writer = mutex.acquire_exclusive_lock();
    let queued_reader = mutex.acquire_shared_lock();
    assert_eq!(mutex.waiting(), 2);

    drop(writer);

    // The reader behind it joins the active one.
    assert_eq!(mutex.waiting(), 0);
    assert_eq!(mutex.active(), 2);
    assert_eq!(mutex.mode(), Mode::Shared);

    drop(queued_reader);
    drop(reader);
    assert_eq!(mutex.mode(), Mode::Free);
}

#[test]
fn test_dropping_granted_request_passes_lock_on() {
    let mutex = SharedMutex::new();
    let gate = mutex.acquire_exclusive_lock_immediate().unwrap();

    let granted_unseen = mutex.acquire_exclusive_lock();
    let next = mutex.acquire_shared_lock();

    drop(gate);
    assert_eq!(mutex.active(), 1);
    assert_eq!(mutex.waiting(), 1);

    drop(granted_unseen);
    assert_eq!(mutex.active(), 1);
    assert_eq!(mutex.waiting(), 0);
    assert_eq!(mutex.mode(), Mode::Shared);

    drop(next);
    assert_eq!(mutex.mode(), Mode::Free);
}
