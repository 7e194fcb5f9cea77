//! A fixed work-stealing thread pool used to parallelise ingestion
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
//  Each worker owns a locked deque and a condition variable. Tasks are pushed round-robin;
//  a worker that drains its own queue steals from the next workers in cyclic order. The
//  `pending` counter is decremented before each task is invoked. The rules core and the
//  parsers are single-threaded per game; the pool only fans out whole files or games.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

type Task = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct Worker {
    queue: Mutex<VecDeque<Task>>,
    signal: Condvar,
}

struct Shared {
    workers: Vec<Worker>,
    pending: AtomicUsize,
    next: AtomicUsize,
    stop: AtomicBool,
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// A fixed set of worker threads with private queues and cyclic stealing.
///
/// Shutdown is cooperative: dropping the pool requests a stop, wakes every worker and
/// joins them. Tasks already dequeued run to completion; queued tasks are discarded.
pub struct ThreadPool {
    shared: Arc<Shared>,
    handles: Vec<thread::JoinHandle<()>>,
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("workers", &self.shared.workers.len())
            .field("pending", &self.shared.pending.load(Ordering::Relaxed))
            .finish()
    }
}

impl ThreadPool {
    /// Creates a pool with `threads` workers (at least one)
    pub fn new(threads: usize) -> ThreadPool {
        let threads = threads.max(1);
        let shared = Arc::new(Shared {
            workers: (0..threads).map(|_| Worker::default()).collect(),
            pending: AtomicUsize::new(0),
            next: AtomicUsize::new(0),
            stop: AtomicBool::new(false),
        });

        let handles = (0..threads)
            .map(|id| {
                let shared = Arc::clone(&shared);
                thread::Builder::new()
                    .name(format!("cdb-worker-{}", id))
                    .spawn(move || worker_loop(&shared, id))
                    .expect("INFALLIBLE")
            })
            .collect();

        ThreadPool { shared, handles }
    }

    /// Enqueues a task on the next worker in round-robin order and wakes it
    pub fn execute<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let id = self.shared.next.fetch_add(1, Ordering::Relaxed) % self.shared.workers.len();
        let worker = &self.shared.workers[id];

        self.shared.pending.fetch_add(1, Ordering::SeqCst);
        worker.queue.lock().expect("INFALLIBLE").push_back(Box::new(task));
        worker.signal.notify_one();
    }

    /// The number of workers
    pub fn len(&self) -> usize {
        self.shared.workers.len()
    }

    /// Always `false`; a pool has at least one worker
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shared.stop.store(true, Ordering::SeqCst);
        for worker in &self.shared.workers {
            worker.signal.notify_all();
        }
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

fn take_task(worker: &Worker) -> Option<Task> {
    worker.queue.lock().expect("INFALLIBLE").pop_front()
}

fn worker_loop(shared: &Shared, id: usize) {
    let mine = &shared.workers[id];
    let count = shared.workers.len();

    while !shared.stop.load(Ordering::SeqCst) {
        // drain whatever is reachable while work is outstanding
        while shared.pending.load(Ordering::Acquire) > 0 && !shared.stop.load(Ordering::SeqCst) {
            let task = take_task(mine)
                .or_else(|| (1..count).find_map(|i| take_task(&shared.workers[(id + i) % count])));

            match task {
                Some(task) => {
                    shared.pending.fetch_sub(1, Ordering::Release);
                    task();
                }
                // the remaining tasks are running on other workers
                None => break,
            }
        }

        let guard = mine.queue.lock().expect("INFALLIBLE");
        if !guard.is_empty() || shared.stop.load(Ordering::SeqCst) {
            continue;
        }
        // bounded wait so cyclic stealing stays live without a wakeup of our own
        let _ = mine
            .signal
            .wait_timeout(guard, Duration::from_millis(20))
            .expect("INFALLIBLE");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn runs_every_task() {
        let pool = ThreadPool::new(4);
        let (tx, rx) = mpsc::channel();

        for i in 0..100 {
            let tx = tx.clone();
            pool.execute(move || tx.send(i).expect("receiver alive"));
        }

        let mut seen: Vec<i32> = (0..100).map(|_| rx.recv().unwrap()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn uneven_tasks_are_stolen() {
        let pool = ThreadPool::new(3);
        let (tx, rx) = mpsc::channel();

        // one long task cannot starve the rest
        for i in 0..30 {
            let tx = tx.clone();
            pool.execute(move || {
                if i == 0 {
                    thread::sleep(Duration::from_millis(50));
                }
                tx.send(()).expect("receiver alive");
            });
        }

        for _ in 0..30 {
            rx.recv_timeout(Duration::from_secs(5)).unwrap();
        }
    }

    #[test]
    fn drop_joins_workers() {
        let pool = ThreadPool::new(2);
        let (tx, rx) = mpsc::channel();

        pool.execute(move || tx.send(1).expect("receiver alive"));
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 1);

        drop(pool);
    }
}
