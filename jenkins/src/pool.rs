//! Bounded worker pool that fetches resources in parallel.
//!
//! Workers claim indices from a shared cursor, so a slow fetch never holds
//! up the rest of the list. Results are published in completion order; use
//! [`FetchStream::ordered`] to restore the input order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::reorder::Reorder;
use crate::Result;

/// Opaque reference to one fetchable resource (a URL).
pub type Locator = String;

/// Number of concurrent fetches.
pub const DEFAULT_WORKERS: usize = 8;

/// Results buffered between the workers and the consumer.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// The outcome of fetching the locator at `index`.
#[derive(Debug)]
pub struct FetchResult<R> {
    /// Position of the locator in the input list.
    pub index: usize,
    pub outcome: Result<R>,
}

impl<R> FetchResult<R> {
    pub fn is_err(&self) -> bool {
        self.outcome.is_err()
    }
}

/// Pool sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    /// Worker threads (at least one is always started).
    pub workers: usize,
    /// Capacity of the result channel.
    pub capacity: usize,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// State shared by every worker of one pool run.
struct Shared<F> {
    locators: Vec<Locator>,
    cursor: Mutex<usize>,
    cancelled: Arc<AtomicBool>,
    fetch: F,
}

impl<F> Shared<F> {
    /// Claim the next index, or `None` once the list is exhausted.
    fn claim(&self) -> Option<usize> {
        // The cursor is a plain counter; a poisoned lock leaves it usable.
        let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        let index = *cursor;
        *cursor += 1;
        drop(cursor);

        (index < self.locators.len()).then_some(index)
    }
}

/// Unordered stream of fetch results, one per locator.
///
/// Dropping the stream cancels the pool: workers stop claiming new
/// locators and exit once their in-flight fetch completes.
pub struct FetchStream<R> {
    rx: Receiver<FetchResult<R>>,
    cancelled: Arc<AtomicBool>,
    len: usize,
}

impl<R> FetchStream<R> {
    /// Number of results the stream will yield.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Restore the input order of the results.
    pub fn ordered(self) -> Reorder<Self, R> {
        let len = self.len;
        Reorder::with_len(self, len)
    }
}

impl<R> Iterator for FetchStream<R> {
    type Item = FetchResult<R>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rx.recv().ok()
    }
}

impl<R> Drop for FetchStream<R> {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

/// Fetch every locator with a bounded pool of worker threads.
///
/// `fetch` failures are recorded in the corresponding [`FetchResult`] and
/// never stop the pool. The stream closes once every worker has exited.
pub fn fetch_all<R, F>(locators: Vec<Locator>, fetch: F, options: PoolOptions) -> Result<FetchStream<R>>
where
    R: Send + 'static,
    F: Fn(&str) -> Result<R> + Send + Sync + 'static,
{
    let len = locators.len();
    let workers = options.workers.max(1).min(len.max(1));
    let (tx, rx) = mpsc::sync_channel(options.capacity);
    let cancelled = Arc::new(AtomicBool::new(false));

    let shared = Arc::new(Shared {
        locators,
        cursor: Mutex::new(0),
        cancelled: Arc::clone(&cancelled),
        fetch,
    });

    debug!(locators = len, workers, "starting fetch pool");

    let mut handles = Vec::with_capacity(workers);
    for id in 0..workers {
        let shared = Arc::clone(&shared);
        let tx = tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("jenq-fetch-{}", id))
            .spawn(move || run_worker(id, &shared, &tx));
        match spawned {
            Ok(handle) => handles.push(handle),
            Err(e) => {
                // Let the workers already running wind down
                cancelled.store(true, Ordering::Relaxed);
                return Err(e.into());
            }
        }
    }

    // The coordinator owns the last sender; the stream closes when it
    // drops it, after every worker has been joined.
    thread::Builder::new()
        .name("jenq-fetch-join".to_string())
        .spawn(move || close_when_done(handles, tx))?;

    Ok(FetchStream { rx, cancelled, len })
}

fn run_worker<R, F>(id: usize, shared: &Shared<F>, tx: &SyncSender<FetchResult<R>>)
where
    F: Fn(&str) -> Result<R>,
{
    loop {
        if shared.cancelled.load(Ordering::Relaxed) {
            debug!(worker = id, "fetch pool cancelled");
            return;
        }

        let Some(index) = shared.claim() else {
            return;
        };

        let locator = &shared.locators[index];
        debug!(worker = id, index, %locator, "fetching");
        let outcome = (shared.fetch)(locator.as_str());
        if let Err(e) = &outcome {
            debug!(worker = id, index, error = %e, "fetch failed");
        }

        if tx.send(FetchResult { index, outcome }).is_err() {
            // Consumer hung up
            return;
        }
    }
}

fn close_when_done<R>(handles: Vec<JoinHandle<()>>, tx: SyncSender<FetchResult<R>>) {
    for handle in handles {
        let name = handle.thread().name().unwrap_or("fetch worker").to_string();
        if handle.join().is_err() {
            warn!(worker = %name, "fetch worker panicked; its claimed result is lost");
        }
    }
    drop(tx);
}
