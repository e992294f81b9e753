//! Pausable fixed-period tick source for Throwdown.
//!
//! The session driver uses one [`TickScheduler`] with a one-second period
//! to run the round countdown. The scheduler only says *when* a second has
//! passed; what a tick means is up to the caller.
//!
//! # Paused mode
//!
//! While paused, [`TickScheduler::wait_for_tick`] pends forever. The
//! driver pauses the scheduler whenever no countdown is running, so an
//! idle client has no timer wakeups at all.
//!
//! # Integration
//!
//! The scheduler is designed to sit inside the driver's `tokio::select!`
//! loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(msg) = inbound_rx.recv() => { /* apply server message */ }
//!         tick = ticker.wait_for_tick() => {
//!             machine.advance(tick.elapsed_periods());
//!         }
//!     }
//! }
//! ```
//!
//! `wait_for_tick` is cancel-safe: no state changes until the sleep
//! completes, so losing the race in `select!` costs nothing.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the tick scheduler.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Time between ticks. Zero is bumped to one millisecond.
    pub period: Duration,
    /// Whether the scheduler starts paused.
    pub start_paused: bool,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(1),
            start_paused: true,
        }
    }
}

impl TickConfig {
    /// Smallest accepted period.
    pub const MIN_PERIOD: Duration = Duration::from_millis(1);

    /// A config with the given period and default settings.
    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            ..Default::default()
        }
    }

    /// Fix out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`TickScheduler::new`].
    pub fn validated(mut self) -> Self {
        if self.period < Self::MIN_PERIOD {
            warn!(period = ?self.period, "tick period too small, clamping");
            self.period = Self::MIN_PERIOD;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tick info (returned to caller each tick)
// ---------------------------------------------------------------------------

/// Information about a fired tick, returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickInfo {
    /// Monotonically increasing tick number (starts at 1).
    pub tick: u64,
    /// `true` if this tick fired noticeably late.
    pub overrun: bool,
    /// Whole periods that passed without a tick because of the delay
    /// (0 in normal operation).
    pub ticks_skipped: u64,
}

impl TickInfo {
    /// Periods that elapsed since the previous tick, counting skipped ones.
    pub fn elapsed_periods(&self) -> u64 {
        1 + self.ticks_skipped
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-period, pausable tick scheduler.
///
/// Missed ticks are never replayed in a burst: after a late wakeup the
/// next tick is scheduled one period from *now*, and the number of missed
/// periods is reported in [`TickInfo::ticks_skipped`].
#[derive(Debug)]
pub struct TickScheduler {
    period: Duration,
    tick_count: u64,
    /// When the next tick should fire. `None` while paused.
    next_tick: Option<Instant>,
}

impl TickScheduler {
    /// Create a new scheduler from config.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let next_tick =
            (!config.start_paused).then(|| Instant::now() + config.period);

        debug!(
            period_ms = config.period.as_millis() as u64,
            paused = config.start_paused,
            "tick scheduler created"
        );

        Self {
            period: config.period,
            tick_count: 0,
            next_tick,
        }
    }

    /// A paused scheduler ticking once per second once resumed.
    pub fn every_second() -> Self {
        Self::new(TickConfig::default())
    }

    /// Wait until the next tick is due.
    ///
    /// While paused this future never resolves; `tokio::select!` keeps
    /// serving its other branches.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let Some(next) = self.next_tick else {
            std::future::pending::<()>().await;
            unreachable!()
        };

        time::sleep_until(next).await;

        let now = Instant::now();
        self.tick_count += 1;

        let late_by = now.saturating_duration_since(next);
        let overrun = late_by > self.period / 10;
        let ticks_skipped = if overrun {
            (late_by.as_nanos() / self.period.as_nanos()) as u64
        } else {
            0
        };
        if ticks_skipped > 0 {
            warn!(
                tick = self.tick_count,
                skipped = ticks_skipped,
                late_ms = late_by.as_millis() as u64,
                "tick overrun, skipping ahead"
            );
        }

        self.next_tick = Some(now + self.period);

        trace!(tick = self.tick_count, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            overrun,
            ticks_skipped,
        }
    }

    /// Stop ticking. Safe to call repeatedly.
    pub fn pause(&mut self) {
        if self.next_tick.take().is_some() {
            debug!(tick = self.tick_count, "tick scheduler paused");
        }
    }

    /// Start (or keep) ticking.
    ///
    /// Resuming a paused scheduler schedules the first tick one full
    /// period from now. Resuming a running scheduler changes nothing, so
    /// calling this after every event doesn't push the next tick back.
    pub fn resume(&mut self) {
        if self.next_tick.is_none() {
            self.next_tick = Some(Instant::now() + self.period);
            debug!(tick = self.tick_count, "tick scheduler resumed");
        }
    }

    /// Pause or resume to match `running`.
    pub fn set_running(&mut self, running: bool) {
        if running {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Discard the current phase and count the next tick a full period
    /// from now, e.g. when a new countdown starts.
    pub fn restart(&mut self) {
        if self.next_tick.is_some() {
            self.next_tick = Some(Instant::now() + self.period);
        }
    }

    /// Whether the scheduler is currently paused.
    pub fn is_paused(&self) -> bool {
        self.next_tick.is_none()
    }

    /// Ticks fired so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// The configured period.
    pub fn period(&self) -> Duration {
        self.period
    }
}
