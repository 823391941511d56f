//! Fixed-size worker pool draining a shared queue.
//!
//! The calling thread feeds items into an unbounded channel; `threads` scoped
//! workers pull from it until it is closed and empty. Each item is handled by
//! exactly one worker. A panic while processing an item is caught, logged and
//! counted, and the worker moves on to the next item.

use std::any::Any;
use std::io::BufRead;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError, mpsc};
use std::thread;

use crate::CancelToken;

/// Upper bound on worker threads.
pub const MAX_THREADS: usize = 1024;

/// Item counts for one [`run_parallel`] call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunnerStats {
    /// Items pushed into the queue.
    pub fed: usize,
    /// Items whose processor returned normally.
    pub completed: usize,
    /// Items whose processor panicked.
    pub panicked: usize,
    /// Items dequeued after cancellation and dropped unprocessed.
    pub cancelled: usize,
}

/// Process every item with `processor` on `threads` workers.
///
/// `threads` is clamped to `1..=MAX_THREADS`. Blocks until the input is
/// exhausted (or `cancel` fires) and every worker has exited. Once `cancel`
/// fires the feeder stops reading input and workers drop whatever is still
/// queued.
pub fn run_parallel<I, F>(
    threads: usize,
    cancel: &CancelToken,
    items: I,
    processor: F,
) -> RunnerStats
where
    I: IntoIterator,
    I::Item: Send,
    F: Fn(I::Item) + Sync,
{
    let threads = threads.clamp(1, MAX_THREADS);
    let (tx, rx) = mpsc::channel::<I::Item>();
    let rx = Mutex::new(rx);
    let completed = AtomicUsize::new(0);
    let panicked = AtomicUsize::new(0);
    let cancelled = AtomicUsize::new(0);

    let fed = thread::scope(|s| {
        for _ in 0..threads {
            s.spawn(|| {
                loop {
                    let next = rx.lock().unwrap_or_else(PoisonError::into_inner).recv();
                    let Ok(item) = next else {
                        break;
                    };
                    if cancel.is_cancelled() {
                        cancelled.fetch_add(1, Ordering::Relaxed);
                        continue;
                    }
                    match panic::catch_unwind(AssertUnwindSafe(|| processor(item))) {
                        Ok(()) => {
                            completed.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(payload) => {
                            panicked.fetch_add(1, Ordering::Relaxed);
                            tracing::error!("worker panicked: {}", panic_message(&*payload));
                        }
                    }
                }
            });
        }

        let mut fed = 0;
        for item in items {
            if cancel.is_cancelled() {
                tracing::warn!("cancelled, stopped reading input after {fed} items");
                break;
            }
            if tx.send(item).is_err() {
                break;
            }
            fed += 1;
        }
        // Closing the channel lets workers exit once the queue drains
        drop(tx);
        fed
    });

    RunnerStats {
        fed,
        completed: completed.into_inner(),
        panicked: panicked.into_inner(),
        cancelled: cancelled.into_inner(),
    }
}

/// Turn a line-oriented reader into an item stream.
///
/// Line terminators are stripped. A read error (including invalid UTF-8)
/// ends the stream and is logged.
pub fn feed_lines<R: BufRead>(reader: R) -> impl Iterator<Item = String> {
    reader.lines().map_while(|line| match line {
        Ok(line) => Some(line),
        Err(e) => {
            tracing::error!("stopped reading input: {e}");
            None
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn assert_exactly_once(threads: usize, count: usize) {
        let hits: Vec<AtomicUsize> = (0..count).map(|_| AtomicUsize::new(0)).collect();

        let stats = run_parallel(threads, &CancelToken::new(), 0..count, |i| {
            hits[i].fetch_add(1, Ordering::Relaxed);
        });

        assert_eq!(
            stats,
            RunnerStats {
                fed: count,
                completed: count,
                panicked: 0,
                cancelled: 0,
            },
            "threads={threads} count={count}"
        );
        for (i, hit) in hits.iter().enumerate() {
            assert_eq!(hit.load(Ordering::Relaxed), 1, "item {i} with {threads} threads");
        }
    }

    #[test]
    fn test_every_item_processed_exactly_once() {
        for threads in [1, 4, 64] {
            for count in [0, 1, 10_000] {
                assert_exactly_once(threads, count);
            }
        }
    }

    #[test]
    fn test_zero_threads_clamped_to_one() {
        let sum = AtomicUsize::new(0);
        let stats = run_parallel(0, &CancelToken::new(), 1..=10, |i| {
            sum.fetch_add(i, Ordering::Relaxed);
        });
        assert_eq!(stats.completed, 10);
        assert_eq!(sum.into_inner(), 55);
    }

    #[test]
    fn test_panic_is_contained() {
        let done = AtomicUsize::new(0);
        let stats = run_parallel(2, &CancelToken::new(), 0..20, |i| {
            assert!(i % 5 != 0, "boom on {i}");
            done.fetch_add(1, Ordering::Relaxed);
        });

        assert_eq!(stats.panicked, 4);
        assert_eq!(stats.completed, 16);
        assert_eq!(done.into_inner(), 16);
    }

    #[test]
    fn test_cancel_drops_queued_items() {
        let cancel = CancelToken::new();
        let stats = run_parallel(1, &cancel, 0..100, |i| {
            if i == 5 {
                cancel.cancel();
            }
        });

        assert_eq!(stats.completed, 6);
        assert_eq!(stats.completed + stats.cancelled, stats.fed);
        assert!(stats.fed <= 100);
    }

    #[test]
    fn test_cancelled_before_start_feeds_nothing() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let stats = run_parallel(4, &cancel, 0..100, |_| {});
        assert_eq!(stats, RunnerStats::default());
    }

    #[test]
    fn test_feed_lines_strips_terminators() {
        let input = Cursor::new("a.example\r\nb.example\n\nc.example");
        let lines: Vec<String> = feed_lines(input).collect();
        assert_eq!(lines, vec!["a.example", "b.example", "", "c.example"]);
    }

    #[test]
    fn test_feed_lines_stops_at_invalid_utf8() {
        let input = Cursor::new(b"ok\n\xff\xfe\nnever\n".to_vec());
        let lines: Vec<String> = feed_lines(input).collect();
        assert_eq!(lines, vec!["ok"]);
    }
}
