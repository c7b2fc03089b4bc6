//! Process-wide play statistics and the out-of-band reporter
//!
//! This module keeps the four counters shared by every session:
//! - Connected clients (sessions currently running)
//! - Completed clients (sessions that have torn down)
//! - Games won and games lost
//!
//! All reads and writes go through one mutex. The lock is only ever held for
//! the few instructions of an update or while formatting a report, never
//! across an `.await`, so a synchronous mutex is used.

use chrono::Local;
use log::{debug, error, info};
use std::fmt::Write as _;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

/// Shown in place of the report time if it cannot be formatted.
const UNKNOWN_TIME: &str = "????";

/// Names one of the registry's counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Connected,
    Completed,
    Won,
    Lost,
}

/// Point-in-time copy of all counters, read under a single lock acquisition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub connected: u64,
    pub completed: u64,
    pub won: u64,
    pub lost: u64,
}

impl StatsSnapshot {
    fn counter_mut(&mut self, counter: Counter) -> &mut u64 {
        match counter {
            Counter::Connected => &mut self.connected,
            Counter::Completed => &mut self.completed,
            Counter::Won => &mut self.won,
            Counter::Lost => &mut self.lost,
        }
    }
}

/// Mutex-guarded statistics shared by all sessions
///
/// Counters are updated independently of one another. A session's teardown
/// is the only place two fields change together (`connected` down,
/// `completed` up), and that happens in one critical section.
#[derive(Debug, Default)]
pub struct StatsRegistry {
    counters: Mutex<StatsSnapshot>,
}

impl StatsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StatsSnapshot> {
        // Counters stay meaningful even if a holder panicked mid-update.
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Atomically adds one to `counter`
    pub fn increment(&self, counter: Counter) {
        let mut counters = self.lock();
        *counters.counter_mut(counter) += 1;
    }

    /// Records the outcome of one finished round
    pub fn record_round(&self, won: bool) {
        self.increment(if won { Counter::Won } else { Counter::Lost });
    }

    /// Marks a session as connected until the returned guard is dropped
    ///
    /// Dropping the guard decrements `connected` and increments `completed`
    /// exactly once, however the session ends.
    pub fn enter_session(self: &Arc<Self>) -> SessionPresence {
        self.increment(Counter::Connected);
        SessionPresence {
            stats: Arc::clone(self),
        }
    }

    fn leave_session(&self) {
        let mut counters = self.lock();
        match counters.connected.checked_sub(1) {
            Some(connected) => counters.connected = connected,
            None => error!("Session teardown with no connected sessions recorded"),
        }
        counters.completed += 1;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        *self.lock()
    }

    /// Writes a report of all counters, stamped with the local time, to `sink`
    ///
    /// The lock is held for the whole write so the report reflects a single
    /// consistent state.
    pub fn report<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        let counters = self.lock();

        writeln!(sink, "Server Stats at {}", local_timestamp())?;
        writeln!(sink, "Connected clients: {}", counters.connected)?;
        writeln!(sink, "Completed clients: {}", counters.completed)?;
        writeln!(sink, "Games won:         {}", counters.won)?;
        writeln!(sink, "Games lost:        {}", counters.lost)?;
        sink.flush()
    }
}

/// Keeps a session counted as connected while alive
#[derive(Debug)]
pub struct SessionPresence {
    stats: Arc<StatsRegistry>,
}

impl Drop for SessionPresence {
    fn drop(&mut self) {
        self.stats.leave_session();
    }
}

/// Current local time in the locale's preferred format, e.g.
/// `Sun Oct 18 14:03:09 2026`
fn local_timestamp() -> String {
    let mut stamp = String::new();
    match write!(stamp, "{}", Local::now().format("%c")) {
        Ok(()) => stamp,
        Err(_) => UNKNOWN_TIME.to_string(),
    }
}

/// Emits a report to `sink` every time `trigger` fires
///
/// Blocks the calling thread between triggers, so run it on a blocking
/// thread (`tokio::task::spawn_blocking`) rather than an async worker.
/// Returns the sink once every trigger sender has been dropped.
pub fn run_reporter<W: Write>(
    stats: Arc<StatsRegistry>,
    mut trigger: mpsc::Receiver<()>,
    mut sink: W,
) -> W {
    while trigger.blocking_recv().is_some() {
        match stats.report(&mut sink) {
            Ok(()) => debug!("Stats report written"),
            Err(e) => error!("Failed to write stats report: {}", e),
        }
    }
    info!("Stats reporter stopped");
    sink
}

/// Turns every SIGHUP delivered to the process into a reporter trigger
#[cfg(unix)]
pub fn hangup_trigger() -> io::Result<mpsc::Receiver<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;
    let (tx, rx) = mpsc::channel(8);

    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            if tx.send(()).await.is_err() {
                break;
            }
        }
    });

    Ok(rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_starts_empty() {
        let stats = StatsRegistry::new();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_increment_each_counter() {
        let stats = StatsRegistry::new();
        stats.increment(Counter::Connected);
        stats.increment(Counter::Completed);
        stats.increment(Counter::Won);
        stats.increment(Counter::Won);
        stats.increment(Counter::Lost);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.connected, 1);
        assert_eq!(snapshot.completed, 1);
        assert_eq!(snapshot.won, 2);
        assert_eq!(snapshot.lost, 1);
    }

    #[test]
    fn test_record_round() {
        let stats = StatsRegistry::new();
        stats.record_round(true);
        stats.record_round(false);
        stats.record_round(false);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.won, 1);
        assert_eq!(snapshot.lost, 2);
        assert_eq!(snapshot.completed, 0);
    }

    #[test]
    fn test_session_presence_lifecycle() {
        let stats = Arc::new(StatsRegistry::new());

        let first = stats.enter_session();
        let second = stats.enter_session();
        assert_eq!(stats.snapshot().connected, 2);

        drop(first);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.connected, 1);
        assert_eq!(snapshot.completed, 1);

        drop(second);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.connected, 0);
        assert_eq!(snapshot.completed, 2);
    }

    #[test]
    fn test_concurrent_sessions_balance() {
        let stats = Arc::new(StatsRegistry::new());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let stats = Arc::clone(&stats);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let _presence = stats.enter_session();
                        stats.record_round(i % 2 == 0);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.connected, 0);
        assert_eq!(snapshot.completed, 1600);
        assert_eq!(snapshot.won + snapshot.lost, 1600);
        assert_eq!(snapshot.won, 800);
    }

    #[test]
    fn test_report_format() {
        let stats = StatsRegistry::new();
        stats.increment(Counter::Won);
        stats.increment(Counter::Lost);
        stats.increment(Counter::Lost);

        let mut sink = Vec::new();
        stats.report(&mut sink).unwrap();
        let report = String::from_utf8(sink).unwrap();
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines.len(), 5);
        let stamp = lines[0].strip_prefix("Server Stats at ").unwrap();
        assert!(!stamp.is_empty());
        assert!(stamp.parse::<u64>().is_err());
        assert_eq!(lines[1], "Connected clients: 0");
        assert_eq!(lines[2], "Completed clients: 0");
        assert_eq!(lines[3], "Games won:         1");
        assert_eq!(lines[4], "Games lost:        2");
    }

    #[test]
    fn test_local_timestamp_matches_locale_format() {
        let stamp = local_timestamp();
        let expected = Local::now().format("%c").to_string();
        // Same shape as a fresh `%c` rendering: weekday, month, day, time, year.
        assert_eq!(stamp.split_whitespace().count(), expected.split_whitespace().count());
        assert_ne!(stamp, UNKNOWN_TIME);
    }

    #[tokio::test]
    async fn test_reporter_emits_once_per_trigger() {
        let stats = Arc::new(StatsRegistry::new());
        let (tx, rx) = mpsc::channel(4);
        let reporter = tokio::task::spawn_blocking({
            let stats = Arc::clone(&stats);
            move || run_reporter(stats, rx, Vec::new())
        });

        tx.send(()).await.unwrap();
        tx.send(()).await.unwrap();
        drop(tx);

        let sink = reporter.await.unwrap();
        let output = String::from_utf8(sink).unwrap();
        assert_eq!(output.matches("Server Stats at").count(), 2);
    }

    /// Sink that stalls on its first write until released.
    struct StalledSink {
        release: std::sync::mpsc::Receiver<()>,
        stalled: bool,
        written: Vec<u8>,
    }

    impl Write for StalledSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if !self.stalled {
                self.stalled = true;
                let _ = self.release.recv();
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_stalled_sink_leaves_runtime_responsive() {
        let stats = Arc::new(StatsRegistry::new());
        let (tx, rx) = mpsc::channel(4);
        let (release_tx, release_rx) = std::sync::mpsc::channel();
        let sink = StalledSink {
            release: release_rx,
            stalled: false,
            written: Vec::new(),
        };

        let reporter = tokio::task::spawn_blocking({
            let stats = Arc::clone(&stats);
            move || run_reporter(stats, rx, sink)
        });
        tx.send(()).await.unwrap();

        // The current-thread runtime still schedules tasks while the report
        // is stuck writing.
        let other = tokio::spawn(async { 42 });
        let value = tokio::time::timeout(std::time::Duration::from_secs(5), other)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(value, 42);

        release_tx.send(()).unwrap();
        drop(tx);
        let sink = reporter.await.unwrap();
        let output = String::from_utf8(sink.written).unwrap();
        assert!(output.starts_with("Server Stats at "));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hangup_trigger_fires_on_sighup() {
        let mut trigger = hangup_trigger().unwrap();

        let status = std::process::Command::new("kill")
            .args(["-HUP", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        let fired = tokio::time::timeout(std::time::Duration::from_secs(5), trigger.recv())
            .await
            .unwrap();
        assert_eq!(fired, Some(()));
    }
}
