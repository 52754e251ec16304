//! Per-turn move clock for the noughts server.
//!
//! Every turn change arms a one-shot [`TurnTimer`] stamped with a fresh
//! [`TurnToken`]. Arming or cancelling advances the token, so an expiry
//! stamped earlier is stale by construction:
//!
//! - the sleeping task compares its token before calling back, and
//! - the session actor compares again when the callback's command arrives
//!   (a move may have been queued in between).
//!
//! Pending sleeps are also aborted on re-arm and cancel.
//!
//! # Integration
//!
//! ```ignore
//! let mut timer = TurnTimer::new(&policy);
//! let tx = cmd_tx.clone();
//! timer.arm(move |token| async move {
//!     let _ = tx.send(SessionCommand::TurnExpired { token }).await;
//! });
//! // later, inside the actor:
//! if !timer.is_current(token) { return; } // stale
//! ```

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// How long each side has per move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimerPolicy {
    /// Seconds per move. 0 disables the clock.
    pub time_limit_secs: u64,
    /// Turbo games forbid short clocks: an enabled limit is at least
    /// [`Self::MIN_TURBO_SECS`].
    pub turbo: bool,
}

impl TimerPolicy {
    /// Smallest enabled limit allowed in turbo mode.
    pub const MIN_TURBO_SECS: u64 = 10;

    /// Builds a policy from a client request, clamping bad values.
    ///
    /// Negative limits become 0 (no clock). In turbo mode a limit between
    /// 1 and 9 seconds is raised to 10.
    pub fn from_request(time_limit_secs: i64, turbo: bool) -> Self {
        let time_limit_secs = if time_limit_secs < 0 {
            warn!(requested = time_limit_secs, "negative time limit, disabling clock");
            0
        } else {
            time_limit_secs as u64
        };
        Self {
            time_limit_secs,
            turbo,
        }
        .validated()
    }

    /// Applies the turbo floor.
    pub fn validated(mut self) -> Self {
        if self.turbo && (1..Self::MIN_TURBO_SECS).contains(&self.time_limit_secs) {
            warn!(
                requested = self.time_limit_secs,
                min = Self::MIN_TURBO_SECS,
                "turbo time limit below minimum, raising"
            );
            self.time_limit_secs = Self::MIN_TURBO_SECS;
        }
        self
    }

    /// The per-move limit, or `None` when the clock is disabled.
    pub fn limit(&self) -> Option<Duration> {
        (self.time_limit_secs > 0).then(|| Duration::from_secs(self.time_limit_secs))
    }
}

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// Stamp identifying one armed turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TurnToken(u64);

impl TurnToken {
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Timer
// ---------------------------------------------------------------------------

/// A one-shot, re-armable turn clock owned by a single session.
#[derive(Debug)]
pub struct TurnTimer {
    limit: Option<Duration>,
    current: Arc<AtomicU64>,
    pending: Option<JoinHandle<()>>,
}

impl TurnTimer {
    pub fn new(policy: &TimerPolicy) -> Self {
        Self {
            limit: policy.limit(),
            current: Arc::new(AtomicU64::new(0)),
            pending: None,
        }
    }

    /// The token of the turn currently on the clock.
    pub fn token(&self) -> TurnToken {
        TurnToken(self.current.load(Ordering::Acquire))
    }

    /// `true` if `token` still names the current turn.
    pub fn is_current(&self, token: TurnToken) -> bool {
        self.token() == token
    }

    /// Whether arming actually starts a clock.
    pub fn is_enabled(&self) -> bool {
        self.limit.is_some()
    }

    /// Starts the clock for a new turn, superseding any pending one.
    ///
    /// `on_expire` runs on a spawned task after the limit elapses, unless
    /// the timer was re-armed or cancelled first. Returns the new turn's
    /// token, or `None` if the clock is disabled (the token still advances).
    pub fn arm<F, Fut>(&mut self, on_expire: F) -> Option<TurnToken>
    where
        F: FnOnce(TurnToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = self.advance();
        let limit = self.limit?;

        let current = Arc::clone(&self.current);
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(limit).await;
            if current.load(Ordering::Acquire) != token.0 {
                trace!(token = token.0, "stale turn timer ignored");
                return;
            }
            on_expire(token).await;
        }));
        debug!(token = token.0, limit_secs = limit.as_secs(), "turn timer armed");
        Some(token)
    }

    /// Stops the clock. Any expiry already in flight is now stale.
    pub fn cancel(&mut self) -> TurnToken {
        self.advance()
    }

    fn advance(&mut self) -> TurnToken {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        TurnToken(self.current.fetch_add(1, Ordering::AcqRel) + 1)
    }
}

impl Drop for TurnTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_negative_limit_disables_clock() {
        let policy = TimerPolicy::from_request(-5, false);
        assert_eq!(policy.time_limit_secs, 0);
        assert_eq!(policy.limit(), None);
    }

    #[test]
    fn test_policy_turbo_raises_short_limit() {
        assert_eq!(TimerPolicy::from_request(3, true).time_limit_secs, 10);
        assert_eq!(TimerPolicy::from_request(9, true).time_limit_secs, 10);
    }

    #[test]
    fn test_policy_turbo_keeps_zero_and_long_limits() {
        assert_eq!(TimerPolicy::from_request(0, true).time_limit_secs, 0);
        assert_eq!(TimerPolicy::from_request(15, true).time_limit_secs, 15);
    }

    #[test]
    fn test_policy_without_turbo_keeps_short_limit() {
        let policy = TimerPolicy::from_request(1, false);
        assert_eq!(policy.limit(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_cancel_advances_token() {
        let mut timer = TurnTimer::new(&TimerPolicy::default());
        let before = timer.token();
        let after = timer.cancel();
        assert!(after > before);
        assert!(!timer.is_current(before));
        assert!(timer.is_current(after));
    }
}
