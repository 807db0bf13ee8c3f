//! The hotkey-versus-countdown race that gates the interactive boot phase.
//!
//! A cooperative single-thread poll loop: each second the platform gets a
//! progress callback, pending input is drained so polled hotkeys are not
//! starved, and the trigger (when one exists) is waited on for one slice.
//! Whichever resolves first wins; the wait is never resumed afterwards.

use crate::platform::{BootPlatform, TriggerWait};
use crate::timing;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    Seconds(u16),
    Forever,
}

impl Countdown {
    /// Raw sentinel meaning "wait forever".
    pub const FOREVER_SENTINEL: u16 = 0xFFFF;

    pub fn from_raw(raw: u16) -> Self {
        if raw == Self::FOREVER_SENTINEL {
            Countdown::Forever
        } else {
            Countdown::Seconds(raw)
        }
    }

    pub fn raw(self) -> u16 {
        match self {
            Countdown::Seconds(seconds) => seconds,
            Countdown::Forever => Self::FOREVER_SENTINEL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    HotkeyFired,
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyWaitConfig {
    /// Stall between decrements when no trigger handle exists. The reference
    /// behaviour here is ambiguous, so the interval is a knob rather than a
    /// hard-coded interpretation.
    pub triggerless_tick: Duration,
}

impl Default for HotkeyWaitConfig {
    fn default() -> Self {
        Self {
            triggerless_tick: timing::DEFAULT_TRIGGERLESS_TICK,
        }
    }
}

impl HotkeyWaitConfig {
    pub fn with_triggerless_tick(mut self, tick: Duration) -> Self {
        self.triggerless_tick = tick;
        self
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HotkeyWait {
    config: HotkeyWaitConfig,
}

impl HotkeyWait {
    pub fn new(config: HotkeyWaitConfig) -> Self {
        Self { config }
    }

    /// Runs the race. A zero countdown skips the loop entirely: `TimedOut`,
    /// no callbacks. On the way out, by either outcome, pending input is
    /// drained once more; after that drain the final `0` callback fires, and
    /// only when a finite non-zero countdown actually ran out.
    pub fn run<P: BootPlatform>(&self, platform: &mut P, countdown: Countdown) -> WaitOutcome {
        let finite = matches!(countdown, Countdown::Seconds(_));
        let mut remaining = countdown.raw();
        let started = remaining != 0;
        let mut outcome = WaitOutcome::TimedOut;
        while remaining != 0 {
            platform.wait_tick(remaining);
            platform.drain_pending_input();
            if platform.has_hotkey_trigger() {
                if platform.wait_for_trigger(timing::TRIGGER_WAIT_SLICE) == TriggerWait::Fired {
                    outcome = WaitOutcome::HotkeyFired;
                    break;
                }
            } else {
                platform.sleep(self.config.triggerless_tick);
            }
            if remaining != Countdown::FOREVER_SENTINEL {
                remaining -= 1;
            }
        }
        // some input sources only surface the trigger via being read
        platform.drain_pending_input();
        if finite && started && outcome == WaitOutcome::TimedOut {
            platform.wait_tick(0);
        }
        outcome
    }
}

/// Async rendition of the same race for concurrency-capable hosts: each
/// iteration bounds the one-shot trigger channel to one wait slice via
/// [`timing::with_timeout`], falling back to a plain sleep once no trigger
/// can fire. A dropped sender degrades to a pure countdown, the same way an
/// absent trigger handle does in the poll loop.
#[cfg(feature = "async-hotkey")]
pub async fn race_trigger<F>(
    trigger: tokio::sync::oneshot::Receiver<()>,
    countdown: Countdown,
    mut on_tick: F,
) -> WaitOutcome
where
    F: FnMut(u16),
{
    let finite = matches!(countdown, Countdown::Seconds(_));
    let mut remaining = countdown.raw();
    let started = remaining != 0;
    let mut trigger = Some(trigger);
    let mut outcome = WaitOutcome::TimedOut;
    while remaining != 0 {
        on_tick(remaining);
        if let Some(mut receiver) = trigger.take() {
            match timing::with_timeout(timing::TRIGGER_WAIT_SLICE, &mut receiver).await {
                Ok(Ok(())) => {
                    outcome = WaitOutcome::HotkeyFired;
                    break;
                }
                Ok(Err(_)) => {} // sender gone; stay triggerless from here on
                Err(_) => trigger = Some(receiver), // slice elapsed, still armed
            }
        } else {
            tokio::time::sleep(timing::TRIGGER_WAIT_SLICE).await;
        }
        if remaining != Countdown::FOREVER_SENTINEL {
            remaining -= 1;
        }
    }
    if finite && started && outcome == WaitOutcome::TimedOut {
        on_tick(0);
    }
    outcome
}
