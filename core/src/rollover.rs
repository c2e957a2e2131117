use std::time::Duration;

use chrono::{Local, NaiveDate};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Source of the current calendar date.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local wall-clock date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rollover {
    pub previous: NaiveDate,
    pub current: NaiveDate,
}

/// Midnight rollover detection.
///
/// The monitor only compares dates and reports changes over a channel. The
/// task that owns the [`Ledger`](crate::ledger::Ledger) applies the reset, so
/// the store keeps a single writer.
pub struct RolloverMonitor<C: Clock> {
    clock: C,
    last_seen: NaiveDate,
}

impl<C: Clock> RolloverMonitor<C> {
    pub fn new(clock: C) -> Self {
        let last_seen = clock.today();
        Self { clock, last_seen }
    }

    /// Start from a known date instead of asking the clock.
    pub fn starting_at(clock: C, last_seen: NaiveDate) -> Self {
        Self { clock, last_seen }
    }

    #[must_use]
    pub fn last_seen(&self) -> NaiveDate {
        self.last_seen
    }

    /// Compare the clock with the last seen date, recording any change.
    pub fn check(&mut self) -> Option<Rollover> {
        let today = self.clock.today();
        if today == self.last_seen {
            return None;
        }
        let rollover = Rollover {
            previous: self.last_seen,
            current: today,
        };
        self.last_seen = today;
        Some(rollover)
    }
}

impl<C: Clock + 'static> RolloverMonitor<C> {
    /// Poll every `interval` on a background task, sending each rollover to
    /// `tx`. The task ends once the receiver is dropped.
    ///
    /// Ticks missed while the process was suspended are skipped, not replayed:
    /// only the date value matters.
    pub fn spawn(mut self, interval: Duration, tx: mpsc::Sender<Rollover>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    () = tx.closed() => break,
                    _ = ticker.tick() => {}
                }
                debug!(last_seen = %self.last_seen, "Checking date");
                if let Some(rollover) = self.check() {
                    info!(
                        previous = %rollover.previous,
                        current = %rollover.current,
                        "Calendar date changed"
                    );
                    if tx.send(rollover).await.is_err() {
                        break;
                    }
                }
            }
            debug!("Rollover monitor stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    struct ManualClock(Arc<Mutex<NaiveDate>>);

    impl ManualClock {
        fn new(date: NaiveDate) -> Self {
            Self(Arc::new(Mutex::new(date)))
        }

        fn set(&self, date: NaiveDate) {
            *self.0.lock().unwrap() = date;
        }
    }

    impl Clock for ManualClock {
        fn today(&self) -> NaiveDate {
            *self.0.lock().unwrap()
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn test_check_same_day() {
        let clock = ManualClock::new(day(15));
        let mut monitor = RolloverMonitor::new(clock);
        assert_eq!(monitor.last_seen(), day(15));
        assert!(monitor.check().is_none());
        assert!(monitor.check().is_none());
    }

    #[test]
    fn test_check_reports_change_once() {
        let clock = ManualClock::new(day(15));
        let mut monitor = RolloverMonitor::new(clock.clone());

        clock.set(day(16));
        assert_eq!(
            monitor.check(),
            Some(Rollover {
                previous: day(15),
                current: day(16),
            })
        );
        assert_eq!(monitor.last_seen(), day(16));
        assert!(monitor.check().is_none());
    }

    #[test]
    fn test_check_skipped_days_reported_as_one() {
        let clock = ManualClock::new(day(15));
        let mut monitor = RolloverMonitor::starting_at(clock.clone(), day(15));

        clock.set(day(18));
        let rollover = monitor.check().unwrap();
        assert_eq!(rollover.previous, day(15));
        assert_eq!(rollover.current, day(18));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_delivers_rollover() {
        let clock = ManualClock::new(day(15));
        let monitor = RolloverMonitor::new(clock.clone());
        let (tx, mut rx) = mpsc::channel(4);
        let handle = monitor.spawn(DEFAULT_CHECK_INTERVAL, tx);

        time::sleep(Duration::from_secs(150)).await;
        assert!(rx.try_recv().is_err());

        clock.set(day(16));
        let rollover = time::timeout(Duration::from_secs(120), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rollover.current, day(16));
        assert_eq!(rollover.previous, day(15));

        drop(rx);
        time::timeout(Duration::from_secs(120), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_stops_when_receiver_dropped() {
        let monitor = RolloverMonitor::new(ManualClock::new(day(15)));
        let (tx, rx) = mpsc::channel(1);
        let handle = monitor.spawn(Duration::from_secs(1), tx);
        drop(rx);
        time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
