mod common;

use interlock::task::{self, spawn};
use interlock::time::{sleep, timeout};
use interlock::{RuntimeBuilder, yield_now};

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

async fn fail(message: &'static str) -> u32 {
    panic!("{message}");
}

#[test]
fn test_single_worker_thread() {
    let rt = RuntimeBuilder::new().worker_threads(1).build().unwrap();

    let result = rt.block_on(async { 42 });
    assert_eq!(result, 42);
}

#[test]
fn test_spawn_from_outside() {
    let rt = RuntimeBuilder::new().worker_threads(2).build().unwrap();

    let handle = rt.spawn(async { 5 });
    assert_eq!(rt.block_on(handle).unwrap(), 5);
}

#[test]
fn test_thread_names() {
    let rt = RuntimeBuilder::new()
        .worker_threads(1)
        .thread_name("pool")
        .build()
        .unwrap();

    let name = rt.block_on(async { thread::current().name().map(str::to_owned) });
    assert_eq!(name.as_deref(), Some("pool-0"));
}

#[test]
fn test_worker_threads_stress() {
    let rt = RuntimeBuilder::new().worker_threads(8).build().unwrap();

    let counter = Arc::new(Mutex::new(0));
    let threads = Arc::new(Mutex::new(HashSet::new()));

    let counter_clone = counter.clone();
    let threads_clone = threads.clone();

    rt.block_on(async move {
        let handles: Vec<_> = (0..100)
            .map(|_| {
                let counter = counter_clone.clone();
                let threads = threads_clone.clone();

                spawn(async move {
                    *counter.lock().unwrap() += 1;
                    threads.lock().unwrap().insert(thread::current().id());
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }
    });

    assert_eq!(*counter.lock().unwrap(), 100);
    assert!(threads.lock().unwrap().len() <= 8);
}

#[test]
#[should_panic(expected = "spawn must be called within the context of a runtime")]
fn test_spawn_outside_runtime_panics() {
    let _ = task::spawn(async {});
}

#[test]
#[should_panic(expected = "root future failed")]
fn test_block_on_resumes_panic() {
    let rt = RuntimeBuilder::new().worker_threads(1).build().unwrap();

    let _ = rt.block_on(fail("root future failed"));
}

#[interlock::test(worker_threads = 1)]
async fn test_worker_survives_task_panic() {
    common::init_tracing();

    let failed = spawn(fail("boom")).await;
    assert!(failed.unwrap_err().is_panic());

    let ok = spawn(async { 7 }).await;
    assert_eq!(ok.unwrap(), 7);
}

#[interlock::test(worker_threads = 1)]
async fn test_yield_now_lets_others_run() {
    let flag = Arc::new(AtomicBool::new(false));

    let other = {
        let flag = flag.clone();
        spawn(async move { flag.store(true, Ordering::SeqCst) })
    };

    while !flag.load(Ordering::SeqCst) {
        yield_now().await;
    }

    other.await.unwrap();
}

#[interlock::test]
async fn test_sleep_waits() {
    let start = Instant::now();
    sleep(Duration::from_millis(30)).await;

    assert!(start.elapsed() >= Duration::from_millis(30));
}

#[interlock::test]
async fn test_timeout_completes_before_deadline() {
    let handle = spawn(async {
        sleep(Duration::from_millis(10)).await;
        123
    });

    let result = timeout(Duration::from_millis(200), handle).await;

    assert!(
        matches!(result, Ok(Ok(123))),
        "Timeout should return Ok(Ok(123))"
    );
}

#[interlock::test]
async fn test_timeout_expires() {
    let handle = spawn(async {
        sleep(Duration::from_millis(200)).await;
        456
    });

    let result = timeout(Duration::from_millis(20), handle).await;

    let err = result.expect_err("deadline should pass first");
    assert_eq!(err.to_string(), "deadline has elapsed");
}

#[interlock::test(worker_threads = 2)]
async fn test_finished_handle_reports_it() {
    let handle = spawn(async { "done" });

    while !handle.is_finished() {
        yield_now().await;
    }

    assert_eq!(handle.await.unwrap(), "done");
}
