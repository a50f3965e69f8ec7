//! Example: readers and writers sharing a table through a `SharedMutex`.
//!
//! The mutex only orders access; the table itself sits in a plain
//! `std::sync::Mutex` that is never contended.

use interlock::sync::SharedMutex;
use interlock::task;
use interlock::time::sleep;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[interlock::main(worker_threads = 4)]
async fn main() {
    let lock = SharedMutex::new();
    let table = Arc::new(Mutex::new(HashMap::<&'static str, u32>::new()));

    let mut handles = Vec::new();

    for round in 0..3u32 {
        for reader in 0..4 {
            let table = table.clone();

            handles.push(task::spawn(lock.run_shared(move || async move {
                let hits = table.lock().unwrap().get("hits").copied();
                println!("round {round}, reader {reader}: hits = {hits:?}");
                sleep(Duration::from_millis(5)).await;
            })));
        }

        let table = table.clone();

        handles.push(task::spawn(lock.run_exclusive(move || async move {
            *table.lock().unwrap().entry("hits").or_default() += 1;
            println!("round {round}, writer: bumped hits");
            sleep(Duration::from_millis(5)).await;
        })));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    println!("final: {:?}", table.lock().unwrap().get("hits"));
}
