use std::time::{Duration, Instant};

/// Decides whether a progress notification may go out at `now`.
///
/// True when nothing has been emitted yet, or when at least `interval`
/// has elapsed since `last_emitted_at` (the boundary is inclusive).
pub fn can_emit(last_emitted_at: Option<Instant>, now: Instant, interval: Duration) -> bool {
    match last_emitted_at {
        None => true,
        Some(last) => now.saturating_duration_since(last) >= interval,
    }
}
