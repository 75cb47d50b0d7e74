//! Poller behavior tests
//!
//! Cancellation latency, retry-less failure handling, and reporting are
//! exercised with mock readers; no kernel map is involved.

use std::collections::VecDeque;
use std::time::Duration;

use anyhow::anyhow;
use assert_matches::assert_matches;
use kprobe_counter::errors::{CounterError, Result};
use kprobe_counter::poller::{CounterPoller, CounterTableReader};
use tokio::sync::watch;
use tokio::time::timeout;

/// Hands out a fixed sequence of totals, then fails.
struct SequenceReader {
    totals: VecDeque<u64>,
}

impl SequenceReader {
    fn new(totals: &[u64]) -> Self {
        Self {
            totals: totals.iter().copied().collect(),
        }
    }
}

impl CounterTableReader for SequenceReader {
    fn read_total(&mut self) -> Result<u64> {
        self.totals
            .pop_front()
            .ok_or_else(|| CounterError::MapReadFailed {
                path: "mock".to_string(),
                source: anyhow!("sequence exhausted"),
            })
    }
}

/// Fails every read.
struct FailingReader;

impl CounterTableReader for FailingReader {
    fn read_total(&mut self) -> Result<u64> {
        Err(CounterError::MapReadFailed {
            path: "mock".to_string(),
            source: anyhow!("injected read failure"),
        })
    }
}

/// Panics if the poller ever reads.
struct UnreachableReader;

impl CounterTableReader for UnreachableReader {
    fn read_total(&mut self) -> Result<u64> {
        panic!("read started after cancellation was signaled");
    }
}

mod reporting {
    use super::*;

    #[tokio::test]
    async fn should_report_each_tick_until_cancelled() {
        let (tx, rx) = watch::channel(false);
        let reader = SequenceReader::new(&[10, 20, 30, 40]);
        let poller = CounterPoller::new(reader, Duration::from_millis(5));

        let mut seen = Vec::new();
        let result = timeout(
            Duration::from_secs(2),
            poller.run_with_observer(rx, |total| {
                seen.push(total);
                if seen.len() == 2 {
                    let _ = tx.send(true);
                }
            }),
        )
        .await
        .expect("poller did not stop after cancellation");

        assert!(result.is_ok());
        // Cancellation was signaled after the second report, so the third
        // value was never read.
        assert_eq!(seen, vec![10, 20]);
    }

    #[test]
    fn should_report_per_cpu_sum_from_snapshot() {
        // Scenario: per-CPU values [3, 5, 2] sum to a reported total of 10.
        let (tx, rx) = watch::channel(false);
        let reader = SequenceReader::new(&[10]);
        let poller = CounterPoller::new(reader, Duration::from_millis(5));

        let mut seen = Vec::new();
        tokio_test::block_on(async {
            timeout(
                Duration::from_secs(2),
                poller.run_with_observer(rx, |total| {
                    seen.push(total);
                    let _ = tx.send(true);
                }),
            )
            .await
            .unwrap()
            .unwrap();
        });

        assert_eq!(seen, vec![10]);
    }
}

mod cancellation {
    use super::*;

    #[tokio::test]
    async fn should_return_promptly_when_cancelled_before_first_tick() {
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        // With a one-minute interval, a prompt return proves the shutdown
        // signal was observed without waiting for a tick.
        let poller = CounterPoller::new(UnreachableReader, Duration::from_secs(60));
        let result = timeout(Duration::from_secs(1), poller.run(rx))
            .await
            .expect("poller did not observe pre-signaled cancellation");

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn should_treat_closed_channel_as_cancellation() {
        let (tx, rx) = watch::channel(false);
        drop(tx);

        let poller = CounterPoller::new(UnreachableReader, Duration::from_secs(60));
        let result = timeout(Duration::from_secs(1), poller.run(rx))
            .await
            .expect("poller did not observe closed shutdown channel");

        assert!(result.is_ok());
    }
}

mod read_failures {
    use super::*;

    #[tokio::test]
    async fn should_stop_on_first_read_failure_without_retry() {
        let (_tx, rx) = watch::channel(false);
        let mut reads_seen = 0;
        let poller = CounterPoller::new(FailingReader, Duration::from_millis(5));

        let result = timeout(
            Duration::from_secs(2),
            poller.run_with_observer(rx, |_| reads_seen += 1),
        )
        .await
        .expect("poller did not stop on read failure");

        assert_matches!(result, Err(CounterError::MapReadFailed { .. }));
        // The failing read is never reported.
        assert_eq!(reads_seen, 0);
    }

    #[tokio::test]
    async fn should_not_report_partial_results_after_failure() {
        let (_tx, rx) = watch::channel(false);
        let reader = SequenceReader::new(&[5]);
        let poller = CounterPoller::new(reader, Duration::from_millis(5));

        let mut seen = Vec::new();
        let result = timeout(
            Duration::from_secs(2),
            poller.run_with_observer(rx, |total| seen.push(total)),
        )
        .await
        .unwrap();

        // One good read, then the exhausted sequence fails the run; the
        // failure itself contributes nothing to the report.
        assert_matches!(result, Err(CounterError::MapReadFailed { .. }));
        assert_eq!(seen, vec![5]);
    }
}
