//! Single-option attempt logic: eligibility filtering for automatic
//! processing, outcome write-back, and the menu cascade after a
//! successful-but-returned boot.

use crate::option::{AttemptOutcome, Category, LoadOption, OptionType};
use crate::platform::BootPlatform;
use crate::telemetry::CycleMetrics;
use log::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptResult {
    /// Whether the execution collaborator was invoked at all.
    pub ran: bool,
    pub succeeded: bool,
}

impl AttemptResult {
    const SKIPPED: Self = Self {
        ran: false,
        succeeded: false,
    };
}

pub struct LoadOptionRunner;

impl LoadOptionRunner {
    /// Automatic attempt: inactive options are skipped, and Boot-type options
    /// outside the Boot category are never auto-run. On success the runner
    /// additionally hands off to `menu` unless the successful option is the
    /// menu itself; the menu attempt never cascades further.
    pub fn attempt<P: BootPlatform>(
        platform: &mut P,
        metrics: &mut CycleMetrics,
        option: &mut LoadOption,
        menu: Option<&mut LoadOption>,
    ) -> AttemptResult {
        if !option.attributes.active() {
            debug!(
                "event=option_skipped name={} reason=inactive",
                option.variable_name()
            );
            return AttemptResult::SKIPPED;
        }
        if option.option_type == OptionType::Boot
            && option.attributes.category() != Category::Boot
        {
            debug!(
                "event=option_skipped name={} reason=category {:?}",
                option.variable_name(),
                option.attributes.category()
            );
            return AttemptResult::SKIPPED;
        }
        let result = Self::run_directly(platform, metrics, option);
        if result.succeeded {
            if let Some(menu) = menu {
                if menu.number != option.number {
                    info!(
                        "event=menu_cascade source={} menu={}",
                        option.variable_name(),
                        menu.variable_name()
                    );
                    metrics.record_menu_handoff();
                    Self::run_directly(platform, metrics, menu);
                }
            }
        }
        result
    }

    /// Deliberate invocation with no eligibility filtering: the menu cascade
    /// and the firmware-UI fast path land here. The menu carries App
    /// category, which only guards *automatic* attempts.
    pub fn run_directly<P: BootPlatform>(
        platform: &mut P,
        metrics: &mut CycleMetrics,
        option: &mut LoadOption,
    ) -> AttemptResult {
        metrics.record_attempt(option.option_type);
        match platform.execute(option) {
            Ok(()) => {
                option.outcome = AttemptOutcome::Success;
                metrics.record_success(option.option_type);
                info!(
                    "event=option_returned name={} outcome=success",
                    option.variable_name()
                );
                AttemptResult {
                    ran: true,
                    succeeded: true,
                }
            }
            Err(err) => {
                option.outcome = AttemptOutcome::Failed(err);
                warn!(
                    "event=option_returned name={} outcome={err:?}",
                    option.variable_name()
                );
                AttemptResult {
                    ran: true,
                    succeeded: false,
                }
            }
        }
    }
}
