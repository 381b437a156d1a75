//! Restores input order to a stream of [`FetchResult`]s.
//!
//! Results that arrive ahead of their turn wait in a buffer keyed by index,
//! so the buffer only grows with the gap between the next expected index
//! and the farthest arrival.

use std::collections::BTreeMap;

use tracing::error;

use crate::pool::FetchResult;
use crate::{Error, Result};

/// Iterator adapter yielding results in strictly increasing index order.
///
/// Each item is `Ok` with the next result (whose own `outcome` may be a
/// fetch error), or `Err(Error::Invariant)` if the upstream indices were
/// not a dense, duplicate-free `0..N`. After an invariant error the
/// iterator is exhausted.
#[derive(Debug)]
pub struct Reorder<I, R> {
    inner: I,
    next: usize,
    expected: Option<usize>,
    pending: BTreeMap<usize, FetchResult<R>>,
    done: bool,
}

impl<I, R> Reorder<I, R>
where
    I: Iterator<Item = FetchResult<R>>,
{
    /// Reorder a stream whose length is not known up front.
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            next: 0,
            expected: None,
            pending: BTreeMap::new(),
            done: false,
        }
    }

    /// Reorder a stream that must yield exactly `len` results.
    pub fn with_len(inner: I, len: usize) -> Self {
        Self {
            expected: Some(len),
            ..Self::new(inner)
        }
    }

    /// Number of results emitted so far.
    pub fn emitted(&self) -> usize {
        self.next
    }

    /// Results currently held back waiting for an earlier index.
    pub fn buffered(&self) -> usize {
        self.pending.len()
    }

    fn emit(&mut self, result: FetchResult<R>) -> Option<Result<FetchResult<R>>> {
        self.next += 1;
        Some(Ok(result))
    }

    fn violation(&mut self, message: String) -> Option<Result<FetchResult<R>>> {
        error!(next = self.next, buffered = self.pending.len(), "{}", message);
        self.done = true;
        self.pending.clear();
        Some(Err(Error::Invariant(message)))
    }

    /// Check every arrival before it is emitted or buffered.
    fn check_arrival(&self, index: usize) -> std::result::Result<(), String> {
        if index < self.next || self.pending.contains_key(&index) {
            return Err(format!("result for index {} delivered more than once", index));
        }
        match self.expected {
            Some(len) if index >= len => Err(format!(
                "result index {} is out of range for {} locators",
                index, len
            )),
            _ => Ok(()),
        }
    }

    fn finish(&mut self) -> Option<Result<FetchResult<R>>> {
        self.done = true;

        if !self.pending.is_empty() {
            let stranded: Vec<usize> = self.pending.keys().copied().collect();
            return self.violation(format!(
                "stream ended while waiting for index {}; stranded results: {:?}",
                self.next, stranded
            ));
        }

        match self.expected {
            Some(len) if self.next != len => self.violation(format!(
                "stream ended after {} of {} results",
                self.next, len
            )),
            _ => None,
        }
    }
}

impl<I, R> Iterator for Reorder<I, R>
where
    I: Iterator<Item = FetchResult<R>>,
{
    type Item = Result<FetchResult<R>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            if let Some(result) = self.pending.remove(&self.next) {
                return self.emit(result);
            }

            let Some(result) = self.inner.next() else {
                return self.finish();
            };

            if let Err(message) = self.check_arrival(result.index) {
                return self.violation(message);
            }

            if result.index == self.next {
                return self.emit(result);
            }
            self.pending.insert(result.index, result);
        }
    }
}
