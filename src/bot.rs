//! Local pace opponent. Stands in for a remote racer so the race
//! coordinator can be exercised without any network transport: it emits
//! the "typed so far" prefix a flawless typist at a fixed pace would
//! have produced after a given elapsed time.

use rand::Rng;

#[derive(Clone, Debug)]
pub struct PaceBot {
    reference: String,
    target_wpm: f64,
}

impl PaceBot {
    pub fn new(reference: impl Into<String>, target_wpm: f64) -> Self {
        Self {
            reference: reference.into(),
            target_wpm: target_wpm.max(0.0),
        }
    }

    /// Pace jittered within ±10% so repeated races don't feel canned.
    pub fn with_jitter(reference: impl Into<String>, target_wpm: f64) -> Self {
        let factor = rand::thread_rng().gen_range(0.9..=1.1);
        Self::new(reference, target_wpm * factor)
    }

    pub fn target_wpm(&self) -> f64 {
        self.target_wpm
    }

    /// The prefix typed after `elapsed_ms` at the target pace.
    /// One word is the standard five characters.
    pub fn typed_at(&self, elapsed_ms: u64) -> &str {
        let chars_done = (self.target_wpm * 5.0 * elapsed_ms as f64 / 60_000.0) as usize;
        match self.reference.char_indices().nth(chars_done) {
            Some((byte_idx, _)) => &self.reference[..byte_idx],
            None => &self.reference,
        }
    }

    /// Elapsed milliseconds at which the bot completes the text.
    pub fn eta_ms(&self) -> Option<u64> {
        if self.target_wpm == 0.0 {
            return None;
        }
        let chars = self.reference.chars().count() as f64;
        Some((chars * 60_000.0 / (self.target_wpm * 5.0)).ceil() as u64)
    }
}
