//! Row-tile work queue shared by a fixed pool of worker threads.
//!
//! Grounded on the teacher's single-threaded WASM tile loop in
//! `gainmap/encode.rs`/`decode.rs` (which processed rows sequentially
//! in-process), generalized here to the multi-threaded row-tile model this
//! crate's generator and applier require. Deliberately hand-rolled rather
//! than built on `rayon`: the scheduling contract (fixed job rows, explicit
//! `mark_done`, no cross-tile ordering guarantee) is itself part of what
//! this crate's concurrency tests assert.

use std::sync::{Condvar, Mutex};

/// Fixed row-tile height used to partition an image into jobs.
pub const JOB_ROWS: u32 = 16;

struct QueueState {
    next_row: u32,
    total_rows: u32,
    in_flight: u32,
    done: bool,
}

/// A bounded queue of row-tile jobs, each job spanning `[start_row, end_row)`.
/// Workers call [`TileQueue::dequeue`] in a loop until it returns `None`, and
/// call [`TileQueue::mark_done`] after finishing a tile so the queue can tell
/// when all work has drained (used by callers that want to block until the
/// image is fully processed rather than just until jobs run out).
pub struct TileQueue {
    state: Mutex<QueueState>,
    cv: Condvar,
}

/// One unit of work: a half-open row range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Job {
    pub start_row: u32,
    pub end_row: u32,
}

impl TileQueue {
    /// Creates a queue of jobs tiling `[0, total_rows)` in steps of
    /// [`JOB_ROWS`] (the last job may be shorter).
    pub fn new(total_rows: u32) -> Self {
        Self {
            state: Mutex::new(QueueState {
                next_row: 0,
                total_rows,
                in_flight: 0,
                done: false,
            }),
            cv: Condvar::new(),
        }
    }

    /// Pulls the next job, or `None` if all rows have been handed out.
    pub fn dequeue(&self) -> Option<Job> {
        let mut state = self.state.lock().unwrap();
        if state.next_row >= state.total_rows {
            return None;
        }
        let start = state.next_row;
        let end = (start + JOB_ROWS).min(state.total_rows);
        state.next_row = end;
        state.in_flight += 1;
        Some(Job {
            start_row: start,
            end_row: end,
        })
    }

    /// Marks one in-flight job complete. Wakes anyone blocked in
    /// [`TileQueue::wait_until_drained`] once the last one finishes.
    pub fn mark_done(&self) {
        let mut state = self.state.lock().unwrap();
        debug_assert!(state.in_flight > 0);
        state.in_flight = state.in_flight.saturating_sub(1);
        if state.next_row >= state.total_rows && state.in_flight == 0 {
            state.done = true;
            self.cv.notify_all();
        }
    }

    /// Blocks the calling thread until every dequeued job has been marked done.
    pub fn wait_until_drained(&self) {
        let state = self.state.lock().unwrap();
        let _guard = self
            .cv
            .wait_while(state, |s| !(s.next_row >= s.total_rows && s.in_flight == 0))
            .unwrap();
    }

    /// Resets the queue to cover `total_rows` again, for reuse across
    /// multiple generate/apply calls on the same worker pool.
    pub fn reset(&self, total_rows: u32) {
        let mut state = self.state.lock().unwrap();
        state.next_row = 0;
        state.total_rows = total_rows;
        state.in_flight = 0;
        state.done = false;
    }

    pub fn total_rows(&self) -> u32 {
        self.state.lock().unwrap().total_rows
    }
}

/// Chooses the worker count: `min(detected_cores, 4)`, with the calling
/// thread acting as one of the workers.
pub fn worker_count() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
        .min(4)
}

/// Runs `f` over every row-tile job in `[0, total_rows)` using
/// `worker_count()` threads (the calling thread included), blocking until
/// all tiles are processed. `f` must be safe to call concurrently for
/// disjoint row ranges.
pub fn run_tiled<F>(total_rows: u32, f: F)
where
    F: Fn(Job) + Sync,
{
    let queue = TileQueue::new(total_rows);
    let workers = worker_count();
    log::debug!("running tiled job over {total_rows} rows with {workers} workers");
    std::thread::scope(|scope| {
        for _ in 1..workers {
            scope.spawn(|| worker_loop(&queue, &f));
        }
        worker_loop(&queue, &f);
    });
}

fn worker_loop<F: Fn(Job)>(queue: &TileQueue, f: &F) {
    while let Some(job) = queue.dequeue() {
        log::trace!("tile job {}..{}", job.start_row, job.end_row);
        f(job);
        queue.mark_done();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn tiles_cover_every_row_exactly_once() {
        let total = 100u32;
        let covered: Vec<_> = (0..total).map(|_| AtomicU32::new(0)).collect();
        run_tiled(total, |job| {
            for r in job.start_row..job.end_row {
                covered[r as usize].fetch_add(1, Ordering::SeqCst);
            }
        });
        for c in &covered {
            assert_eq!(c.load(Ordering::SeqCst), 1);
        }
    }

    #[test]
    fn dequeue_returns_none_once_exhausted() {
        let q = TileQueue::new(10);
        let mut jobs = 0;
        while let Some(job) = q.dequeue() {
            q.mark_done();
            jobs += 1;
            assert!(job.end_row <= 10);
        }
        assert!(jobs >= 1);
        assert!(q.dequeue().is_none());
    }

    #[test]
    fn reset_allows_reuse() {
        let q = TileQueue::new(5);
        while q.dequeue().is_some() {
            q.mark_done();
        }
        q.reset(20);
        assert_eq!(q.total_rows(), 20);
        assert!(q.dequeue().is_some());
    }
}
