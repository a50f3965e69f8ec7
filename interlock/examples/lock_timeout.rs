//! Example: giving up on a lock after a deadline.

use interlock::sync::Mutex;
use interlock::task;
use interlock::time::{sleep, timeout};

use std::time::Duration;

#[interlock::main]
async fn main() {
    let mutex = Mutex::new();

    let holder = task::spawn(mutex.run_exclusive(|| async {
        sleep(Duration::from_millis(200)).await;
        println!("holder: done");
    }));

    match timeout(Duration::from_millis(50), mutex.acquire_lock()).await {
        Ok(_lock) => println!("impatient: got the lock"),
        Err(elapsed) => println!("impatient: {elapsed}, {} still waiting", mutex.waiting()),
    }

    holder.await.unwrap();

    let lock = mutex.acquire_lock().await;
    println!("patient: got the lock");
    lock.release();
}
