//! End-to-end tests for complete focus cycles.
//!
//! The engine runs with its real tick source under paused tokio time, so a
//! full multi-session cycle finishes instantly while still going through
//! every tick, notification and counter write.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use focustimer::daemon::{EngineChannels, Tick, TimerEngine, TimerEvent};
use focustimer::notification::MockNotifier;
use focustimer::stats::{JsonFileStore, SessionCounters};
use focustimer::types::{Phase, TimerConfig, TimerOptions};

// ============================================================================
// Test Helpers
// ============================================================================

struct Cycle {
    engine: TimerEngine,
    notifier: Arc<MockNotifier>,
    tick_rx: mpsc::UnboundedReceiver<Tick>,
    event_rx: mpsc::UnboundedReceiver<TimerEvent>,
}

impl Cycle {
    fn new(config: TimerConfig, options: TimerOptions, counters: SessionCounters) -> Self {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let notifier = Arc::new(MockNotifier::new());
        let engine = TimerEngine::new(
            config,
            options,
            Box::new(notifier.clone()),
            counters,
            EngineChannels { tick_tx, event_tx },
        );
        Self {
            engine,
            notifier,
            tick_rx,
            event_rx,
        }
    }

    /// Feeds ticks until the engine stops ticking.
    async fn run_until_idle(&mut self) -> u32 {
        let mut ticks = 0;
        while self.engine.is_ticking() {
            let tick = timeout(Duration::from_secs(5), self.tick_rx.recv())
                .await
                .unwrap()
                .unwrap();
            self.engine.on_tick(tick);
            ticks += 1;
        }
        ticks
    }

    fn entered_phases(&mut self) -> Vec<(Phase, u32)> {
        let mut phases = Vec::new();
        while let Ok(event) = self.event_rx.try_recv() {
            if let TimerEvent::PhaseEntered { phase, session, .. } = event {
                phases.push((phase, session));
            }
        }
        phases
    }
}

fn file_counters(path: &Path) -> SessionCounters {
    SessionCounters::load(Box::new(JsonFileStore::new(path)))
}

fn auto_start_all() -> TimerOptions {
    TimerOptions {
        auto_start_work: true,
        auto_start_break: true,
        ..TimerOptions::default()
    }
}

// ============================================================================
// Automatic Cycle
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_next_work_waits_without_auto_start_work() {
    let options = TimerOptions {
        auto_start_break: true,
        ..TimerOptions::default()
    };
    let mut cycle = Cycle::new(
        TimerConfig::clamped(25, 5, 2),
        options,
        SessionCounters::in_memory(),
    );

    cycle.engine.start().unwrap();
    let ticks = cycle.run_until_idle().await;

    // Work and its break run back to back; the next work phase waits.
    assert_eq!(ticks, (25 + 5) * 60);
    let state = cycle.engine.state();
    assert_eq!(state.phase, Phase::Work);
    assert_eq!(state.current_session, 2);
    assert_eq!(state.remaining_sessions, 1);
    assert!(!state.running);
    assert_eq!(cycle.engine.counters().work_sessions, 1);
    assert_eq!(cycle.engine.counters().break_sessions, 1);
    assert_eq!(cycle.notifier.notification_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_full_cycle_wraps_to_first_session() {
    let dir = tempfile::tempdir().unwrap();
    let counter_file = dir.path().join("counters.json");
    let mut cycle = Cycle::new(
        TimerConfig::clamped(15, 5, 2),
        auto_start_all(),
        file_counters(&counter_file),
    );

    cycle.engine.start().unwrap();
    let mut ticks = 0;
    // W1 B1 W2 B2, then stop at the start of the next cycle.
    while cycle.engine.counters().break_sessions < 2 {
        let tick = timeout(Duration::from_secs(5), cycle.tick_rx.recv())
            .await
            .unwrap()
            .unwrap();
        cycle.engine.on_tick(tick);
        ticks += 1;
    }
    cycle.engine.pause();

    assert_eq!(ticks, 2 * (15 + 5) * 60);
    assert_eq!(
        cycle.entered_phases(),
        vec![
            (Phase::Break, 1),
            (Phase::Work, 2),
            (Phase::Break, 2),
            (Phase::Work, 1),
        ]
    );
    let state = cycle.engine.state();
    assert_eq!(state.remaining_sessions, 2);
    assert_eq!(state.remaining_seconds, 15 * 60);

    let reloaded = file_counters(&counter_file);
    assert_eq!(reloaded.snapshot().work_sessions, 2);
    assert_eq!(reloaded.snapshot().break_sessions, 2);
}

#[tokio::test(start_paused = true)]
async fn test_completion_notices_carry_focused_task() {
    let mut cycle = Cycle::new(
        TimerConfig::clamped(15, 5, 1),
        TimerOptions::default(),
        SessionCounters::in_memory(),
    );
    cycle
        .engine
        .set_focused_task(Some("設計書".to_string()));

    cycle.engine.start().unwrap();
    cycle.run_until_idle().await;

    let notices = cycle.notifier.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].phase, Phase::Work);
    assert_eq!(notices[0].focused_task.as_deref(), Some("設計書"));
    assert!(notices[0].sound_enabled);
    assert_eq!(cycle.engine.state().phase, Phase::Break);
}

// ============================================================================
// Manual Mode
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_manual_timeout_then_advance_counts_once() {
    let options = TimerOptions {
        manual_mode: true,
        ..TimerOptions::default()
    };
    let mut cycle = Cycle::new(
        TimerConfig::clamped(15, 5, 2),
        options,
        SessionCounters::in_memory(),
    );

    cycle.engine.start().unwrap();
    cycle.run_until_idle().await;

    let state = cycle.engine.state();
    assert_eq!(state.phase, Phase::Work);
    assert_eq!(state.remaining_seconds, 0);
    assert!(!state.running);
    assert_eq!(cycle.engine.counters().work_sessions, 1);

    cycle.engine.advance_phase().unwrap();

    assert_eq!(cycle.engine.state().phase, Phase::Break);
    assert_eq!(cycle.engine.counters().work_sessions, 1);
    assert!(!cycle.engine.is_ticking());
}

// ============================================================================
// Configure
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_configure_mid_countdown_discards_pending_ticks() {
    let mut cycle = Cycle::new(
        TimerConfig::default(),
        TimerOptions::default(),
        SessionCounters::in_memory(),
    );
    cycle.engine.start().unwrap();
    for _ in 0..10 {
        let tick = cycle.tick_rx.recv().await.unwrap();
        cycle.engine.on_tick(tick);
    }

    // Any tick queued before the reset must not count down.
    tokio::time::sleep(Duration::from_millis(1000)).await;
    cycle.engine.configure(TimerConfig::clamped(30, 5, 4));
    while let Ok(stale) = cycle.tick_rx.try_recv() {
        cycle.engine.on_tick(stale);
    }

    let state = cycle.engine.state();
    assert_eq!(state.remaining_seconds, 30 * 60);
    assert!(!state.running);
    assert!(!cycle.engine.is_ticking());
}

// ============================================================================
// Flow
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_flow_completion_matches_natural_timeout() {
    let mut natural = Cycle::new(
        TimerConfig::clamped(15, 5, 2),
        auto_start_all(),
        SessionCounters::in_memory(),
    );
    natural.engine.start().unwrap();
    while natural.engine.state().phase == Phase::Work {
        let tick = natural.tick_rx.recv().await.unwrap();
        natural.engine.on_tick(tick);
    }

    let mut flow = Cycle::new(
        TimerConfig::clamped(15, 5, 2),
        auto_start_all(),
        SessionCounters::in_memory(),
    );
    flow.engine.start().unwrap();
    flow.engine.enter_flow().unwrap();
    tokio::time::sleep(Duration::from_secs(40 * 60)).await;
    flow.engine.complete_flow().unwrap();

    let a = natural.engine.state();
    let b = flow.engine.state();
    assert_eq!(a.phase, b.phase);
    assert_eq!(a.remaining_seconds, b.remaining_seconds);
    assert_eq!(a.current_session, b.current_session);
    assert_eq!(a.remaining_sessions, b.remaining_sessions);
    assert_eq!(a.running, b.running);
    assert_eq!(
        natural.engine.counters().work_sessions,
        flow.engine.counters().work_sessions
    );
}
