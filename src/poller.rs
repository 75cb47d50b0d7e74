//! Counter poller
//!
//! On a fixed interval, reads the per-CPU counter array, sums it, and
//! reports the total as one log line. The shutdown flag is checked before
//! every read, so cancellation latency is bounded by one tick and a read
//! is never interrupted mid-flight. A read failure ends the run; there is
//! no internal retry.

use std::path::PathBuf;

use aya::maps::{Map, MapData, PerCpuArray};
use aya::Pod;
use log::info;
use tokio::sync::watch;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

use crate::errors::{CounterError, Result};

/// Layout of one per-CPU record in the counter map.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct StatsRecord {
    pub counter: u64,
}

unsafe impl Pod for StatsRecord {}

/// Sum of the per-CPU counters. Order-independent; two reads of an
/// unchanged snapshot are equal.
pub fn sum_counters(records: &[StatsRecord]) -> u64 {
    records.iter().map(|r| r.counter).sum()
}

/// One open/read/sum cycle against the counter table.
pub trait CounterTableReader {
    fn read_total(&mut self) -> Result<u64>;
}

/// Reads the kernel-pinned per-CPU array. The map is opened fresh each
/// cycle and released implicitly when the cycle ends.
pub struct PinnedTableReader {
    path: PathBuf,
}

impl PinnedTableReader {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl CounterTableReader for PinnedTableReader {
    fn read_total(&mut self) -> Result<u64> {
        let data = MapData::from_pin(&self.path).map_err(|e| CounterError::MapOpenFailed {
            path: self.path.display().to_string(),
            source: e.into(),
        })?;
        let array: PerCpuArray<MapData, StatsRecord> = Map::PerCpuArray(data)
            .try_into()
            .map_err(|e: aya::maps::MapError| CounterError::MapOpenFailed {
                path: self.path.display().to_string(),
                source: e.into(),
            })?;
        let values = array
            .get(&0, 0)
            .map_err(|e| CounterError::MapReadFailed {
                path: self.path.display().to_string(),
                source: e.into(),
            })?;
        Ok(sum_counters(&values))
    }
}

pub struct CounterPoller<R> {
    reader: R,
    interval: Duration,
}

impl<R: CounterTableReader> CounterPoller<R> {
    pub fn new(reader: R, interval: Duration) -> Self {
        Self { reader, interval }
    }

    pub async fn run(self, shutdown: watch::Receiver<bool>) -> Result<()> {
        self.run_with_observer(shutdown, |_| {}).await
    }

    /// Like `run`, but hands every reported total to `observe` as well.
    pub async fn run_with_observer(
        mut self,
        mut shutdown: watch::Receiver<bool>,
        mut observe: impl FnMut(u64),
    ) -> Result<()> {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            // Checked before every read; covers a signal raised before the
            // loop was entered.
            if *shutdown.borrow() {
                info!("exiting kprobe poller");
                return Ok(());
            }
            tokio::select! {
                biased;
                // A closed channel counts as cancellation too.
                _ = shutdown.changed() => {
                    info!("exiting kprobe poller");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    let total = self.reader.read_total()?;
                    info!("kprobe: count: {total}");
                    observe(total);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_sum_all_per_cpu_counters() {
        let records = [
            StatsRecord { counter: 3 },
            StatsRecord { counter: 5 },
            StatsRecord { counter: 2 },
        ];
        assert_eq!(sum_counters(&records), 10);
    }

    #[test]
    fn should_sum_independently_of_order() {
        let forward = [
            StatsRecord { counter: 1 },
            StatsRecord { counter: 2 },
            StatsRecord { counter: 3 },
        ];
        let reversed = [
            StatsRecord { counter: 3 },
            StatsRecord { counter: 2 },
            StatsRecord { counter: 1 },
        ];
        assert_eq!(sum_counters(&forward), sum_counters(&reversed));
    }

    #[test]
    fn should_sum_empty_table_to_zero() {
        assert_eq!(sum_counters(&[]), 0);
    }

    #[test]
    fn should_yield_equal_totals_for_unchanged_snapshot() {
        let snapshot = [StatsRecord { counter: 7 }, StatsRecord { counter: 11 }];
        assert_eq!(sum_counters(&snapshot), sum_counters(&snapshot));
    }
}
