// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod bot;
pub mod clock;
pub mod config;
pub mod corpus;
pub mod metrics;
pub mod race;
pub mod results;
pub mod scheduler;
pub mod session;

/// Reference cadence for elapsed-time refresh. Purely a display rate;
/// elapsed values come from timestamp deltas, never from tick counts.
pub const TICK_RATE_MS: u64 = 250;
