use crate::clock::{system_clock, SharedClock};
use crate::metrics;
use serde::Serialize;

/// Where a session is in its life. `Finished` is terminal for input;
/// only `load_text` or `reset` starts a new attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Idle,
    Running,
    Finished,
}

/// Point-in-time view of a session's derived metrics.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub wpm: f64,
    pub cpm: f64,
    pub accuracy: f64,
    pub errors: usize,
    pub elapsed_millis: u64,
}

/// One participant's typing attempt against a fixed reference text.
///
/// The session is an owned value: exactly one input stream mutates it.
/// Elapsed time is always recomputed as `now - started_at`, never
/// accumulated from ticks, so scheduler jitter cannot cause drift.
pub struct Session {
    clock: SharedClock,
    reference: String,
    typed: String,
    lifecycle: Lifecycle,
    started_at_ms: Option<u64>,
    elapsed_ms: u64,
    error_count: usize,
    // Keystroke history for accuracy. `error_count` reflects the current
    // typed value and drops when mistakes are corrected; these two only
    // grow, so a corrected mistake still costs accuracy.
    total_keystrokes: usize,
    committed_errors: usize,
}

impl Session {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock,
            reference: String::new(),
            typed: String::new(),
            lifecycle: Lifecycle::Idle,
            started_at_ms: None,
            elapsed_ms: 0,
            error_count: 0,
            total_keystrokes: 0,
            committed_errors: 0,
        }
    }

    /// Session on the process clock, loaded with `text`.
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut session = Self::new(system_clock());
        session.load_text(text);
        session
    }

    /// Hard reset with new content. Valid from any state; discards
    /// in-flight timing.
    pub fn load_text(&mut self, text: impl Into<String>) {
        self.reference = text.into();
        self.typed.clear();
        self.lifecycle = Lifecycle::Idle;
        self.started_at_ms = None;
        self.elapsed_ms = 0;
        self.error_count = 0;
        self.total_keystrokes = 0;
        self.committed_errors = 0;
    }

    /// Back to the exact initial state, reference text included.
    pub fn reset(&mut self) {
        self.load_text(String::new());
    }

    /// Record the start instant. Idempotent once running or finished.
    ///
    /// A zero-length reference does not finish here; it finishes on the
    /// first `update_typed("")`, where `"" == ""` holds.
    pub fn start(&mut self) {
        let now = self.clock.now_ms();
        self.start_at(now);
    }

    /// Start with an externally supplied instant. Races use this so every
    /// participant shares the scheduled start as its timing base.
    pub fn start_at(&mut self, instant_ms: u64) {
        if self.started_at_ms.is_none() && self.lifecycle != Lifecycle::Finished {
            self.started_at_ms = Some(instant_ms);
            self.lifecycle = Lifecycle::Running;
        }
    }

    /// Replace the typed-so-far value and recompute progress.
    ///
    /// Error counting compares only the overlap of the two strings;
    /// a typed value running past the reference adds no further errors.
    /// No-op once finished.
    pub fn update_typed(&mut self, new_typed: &str) {
        if self.lifecycle == Lifecycle::Finished {
            return;
        }

        if self.lifecycle == Lifecycle::Idle && !new_typed.is_empty() {
            self.start();
        }

        // Positions past the previous typed length are fresh keystrokes;
        // a shrink-then-regrow (backspace correction) counts the retyped
        // characters again.
        let prev_chars = self.typed.chars().count();
        let mut expected = self.reference.chars().skip(prev_chars);
        for typed in new_typed.chars().skip(prev_chars) {
            self.total_keystrokes += 1;
            if let Some(expected) = expected.next() {
                if typed != expected {
                    self.committed_errors += 1;
                }
            }
        }

        self.typed.clear();
        self.typed.push_str(new_typed);
        self.error_count = self
            .typed
            .chars()
            .zip(self.reference.chars())
            .filter(|(typed, expected)| typed != expected)
            .count();

        if self.typed == self.reference {
            self.elapsed_ms = match self.started_at_ms {
                Some(start) => self.clock.now_ms().saturating_sub(start),
                None => 0,
            };
            self.lifecycle = Lifecycle::Finished;
        } else if self.lifecycle == Lifecycle::Running {
            self.refresh_elapsed();
        }
    }

    /// Refresh the displayed elapsed value. Meant to be driven on a fixed
    /// cadence; commutative and idempotent, touches nothing but `elapsed`.
    pub fn tick(&mut self) {
        if self.lifecycle == Lifecycle::Running {
            self.refresh_elapsed();
        }
    }

    fn refresh_elapsed(&mut self) {
        if let Some(start) = self.started_at_ms {
            self.elapsed_ms = self.clock.now_ms().saturating_sub(start);
        }
    }

    /// Current metrics through the pure calculators. Valid in any state;
    /// all zeros (and 100% accuracy) before the first keystroke.
    ///
    /// Accuracy is computed over the keystroke history rather than the
    /// current typed value, so two finished sessions remain comparable
    /// even though both end with `typed == reference`.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let chars_typed = self.typed.chars().count();
        MetricsSnapshot {
            wpm: metrics::wpm(chars_typed, self.elapsed_ms),
            cpm: metrics::cpm(chars_typed, self.elapsed_ms),
            accuracy: metrics::accuracy(self.total_keystrokes, self.committed_errors),
            errors: self.error_count,
            elapsed_millis: self.elapsed_ms,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn typed(&self) -> &str {
        &self.typed
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn total_keystrokes(&self) -> usize {
        self.total_keystrokes
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn has_started(&self) -> bool {
        self.started_at_ms.is_some()
    }

    pub fn has_finished(&self) -> bool {
        self.lifecycle == Lifecycle::Finished
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("reference", &self.reference)
            .field("typed", &self.typed)
            .field("lifecycle", &self.lifecycle)
            .field("started_at_ms", &self.started_at_ms)
            .field("elapsed_ms", &self.elapsed_ms)
            .field("error_count", &self.error_count)
            .finish()
    }
}
