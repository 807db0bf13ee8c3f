//! Centralized wait intervals for the interactive boot phase.
//!
//! Keeping these in one place makes it clear which waits share behaviour and
//! gives a single knob if a platform needs the countdown loosened.

use std::time::Duration;

/// How long one trigger wait lasts inside the countdown loop.
pub const TRIGGER_WAIT_SLICE: Duration = Duration::from_secs(1);
/// Default tick when no trigger handle exists and the loop degrades to plain
/// sleeping. Kept configurable via `HotkeyWaitConfig`.
pub const DEFAULT_TRIGGERLESS_TICK: Duration = Duration::from_secs(1);

/// Bounds one trigger wait to `duration`; `Err` means the slice elapsed with
/// the future still pending. Backs the async countdown's per-second wait,
/// so it exists only when that feature is enabled.
#[cfg(feature = "async-hotkey")]
pub async fn with_timeout<F, T>(
    duration: Duration,
    fut: F,
) -> Result<T, tokio::time::error::Elapsed>
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(duration, fut).await
}
