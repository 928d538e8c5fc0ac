//! Clock tick source.
//!
//! A single tokio task drives the countdown. Every tick carries the
//! generation of the task that produced it; stopping or restarting the
//! source bumps the generation, so ticks still queued from a cancelled
//! task are recognised and dropped by the engine.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

// ============================================================================
// Constants
// ============================================================================

/// Tick period in normal operation (milliseconds)
pub const NORMAL_TICK_MS: u64 = 1000;

/// Tick period in dev mode (milliseconds)
pub const ACCELERATED_TICK_MS: u64 = 50;

// ============================================================================
// Cadence
// ============================================================================

/// Tick rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// One tick per second
    Normal,
    /// Dev mode: one tick per 50ms
    Accelerated,
}

impl Cadence {
    /// Selects the cadence for the dev mode flag.
    pub fn from_dev_mode(dev_mode: bool) -> Self {
        if dev_mode {
            Cadence::Accelerated
        } else {
            Cadence::Normal
        }
    }

    /// Returns the tick period.
    pub fn period(&self) -> Duration {
        match self {
            Cadence::Normal => Duration::from_millis(NORMAL_TICK_MS),
            Cadence::Accelerated => Duration::from_millis(ACCELERATED_TICK_MS),
        }
    }
}

// ============================================================================
// Tick
// ============================================================================

/// One tick, tagged with the generation of the task that sent it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Generation of the producing task
    pub generation: u64,
}

// ============================================================================
// TickSource
// ============================================================================

/// Owner of the periodic tick task.
pub struct TickSource {
    tx: mpsc::UnboundedSender<Tick>,
    handle: Option<JoinHandle<()>>,
    generation: u64,
}

impl TickSource {
    /// Creates an idle tick source that will send on `tx`.
    pub fn new(tx: mpsc::UnboundedSender<Tick>) -> Self {
        Self {
            tx,
            handle: None,
            generation: 0,
        }
    }

    /// Starts ticking at `cadence`, cancelling any running task first.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, cadence: Cadence) {
        self.stop();

        let generation = self.generation;
        let tx = self.tx.clone();
        let period = cadence.period();

        self.handle = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                if tx.send(Tick { generation }).is_err() {
                    tracing::debug!("tick receiver dropped, stopping tick task");
                    break;
                }
            }
        }));

        tracing::debug!("tick source started: generation={}, period={:?}", generation, period);
    }

    /// Stops ticking. Ticks already queued become stale.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.generation = self.generation.wrapping_add(1);
    }

    /// Returns true if `tick` was produced by the live task.
    pub fn accepts(&self, tick: &Tick) -> bool {
        self.handle.is_some() && tick.generation == self.generation
    }

    /// Returns true while a tick task is running.
    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    /// Returns the current generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for TickSource {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod cadence_tests {
        use super::*;

        #[test]
        fn test_from_dev_mode() {
            assert_eq!(Cadence::from_dev_mode(false), Cadence::Normal);
            assert_eq!(Cadence::from_dev_mode(true), Cadence::Accelerated);
        }

        #[test]
        fn test_period() {
            assert_eq!(Cadence::Normal.period(), Duration::from_secs(1));
            assert_eq!(Cadence::Accelerated.period(), Duration::from_millis(50));
        }
    }

    mod tick_source_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_start_sends_ticks_of_live_generation() {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let mut source = TickSource::new(tx);

            source.start(Cadence::Normal);
            let tick = rx.recv().await.unwrap();

            assert!(source.is_active());
            assert!(source.accepts(&tick));
        }

        #[tokio::test(start_paused = true)]
        async fn test_first_tick_waits_one_period() {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let mut source = TickSource::new(tx);
            let started = Instant::now();

            source.start(Cadence::Normal);
            rx.recv().await.unwrap();

            assert!(started.elapsed() >= Duration::from_secs(1));
        }

        #[tokio::test(start_paused = true)]
        async fn test_stop_silences_source() {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let mut source = TickSource::new(tx);

            source.start(Cadence::Accelerated);
            source.stop();
            tokio::time::sleep(Duration::from_secs(2)).await;

            assert!(rx.try_recv().is_err());
            assert!(!source.is_active());
        }

        #[tokio::test(start_paused = true)]
        async fn test_restart_makes_old_ticks_stale() {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let mut source = TickSource::new(tx);

            source.start(Cadence::Normal);
            let old = rx.recv().await.unwrap();
            source.start(Cadence::Normal);
            let fresh = rx.recv().await.unwrap();

            assert!(!source.accepts(&old));
            assert!(source.accepts(&fresh));
        }

        #[tokio::test(start_paused = true)]
        async fn test_stopped_source_accepts_nothing() {
            let (tx, _rx) = mpsc::unbounded_channel();
            let mut source = TickSource::new(tx);
            source.stop();

            let tick = Tick {
                generation: source.generation(),
            };

            assert!(!source.accepts(&tick));
        }
    }
}
