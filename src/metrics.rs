//! Pure metric conversions. One "word" is the standard five characters.

const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// Words per minute over the elapsed interval. Zero elapsed yields zero
/// rather than a division by zero.
pub fn wpm(chars_typed: usize, elapsed_ms: u64) -> f64 {
    if elapsed_ms == 0 {
        return 0.0;
    }
    (chars_typed as f64 / 5.0) / (elapsed_ms as f64 / MILLIS_PER_MINUTE)
}

/// Characters per minute over the elapsed interval.
pub fn cpm(chars_typed: usize, elapsed_ms: u64) -> f64 {
    if elapsed_ms == 0 {
        return 0.0;
    }
    chars_typed as f64 / (elapsed_ms as f64 / MILLIS_PER_MINUTE)
}

/// Accuracy percentage in `[0, 100]`. No attempts counts as perfect by
/// convention, not undefined.
pub fn accuracy(total_typed: usize, errors: usize) -> f64 {
    if total_typed == 0 {
        return 100.0;
    }
    let correct = total_typed.saturating_sub(errors);
    (100.0 * correct as f64 / total_typed as f64).clamp(0.0, 100.0)
}
