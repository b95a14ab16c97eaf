/*!
 * Scroll-control arbitration between playback and the user.
 *
 * The governor layers a two-state machine over sync-engine output: while
 * the player controls scrolling, engine scroll commands pass through;
 * once the user scrolls manually, commands are suppressed until either an
 * idle period elapses or an explicit click/seek hands control back.
 *
 * There are no real-clock timers here. The governor stores the last
 * manual-input timestamp and compares it against the idle threshold on
 * every arbitration call, which keeps the state machine deterministic
 * under test and leaves nothing to cancel on teardown.
 */

use log::debug;
use serde::{Deserialize, Serialize};

use super::engine::{ScrollCommand, TickUpdate};

/// Idle period after the last manual input before control reverts
const USER_IDLE_REVERT_MS: u64 = 4_000;

/// Configuration for scroll arbitration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernorConfig {
    /// Idle period in ms before user control reverts to the player
    pub user_idle_revert_ms: u64,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self { user_idle_revert_ms: USER_IDLE_REVERT_MS }
    }
}

/// Who currently owns the scroll position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ScrollControl {
    /// Playback drives scrolling (initial state)
    #[default]
    PlayerControlled,
    /// A manual scroll suspended playback-driven scrolling
    UserControlled,
}

/// Arbiter between playback-driven and user-driven scrolling
pub struct ScrollGovernor {
    config: GovernorConfig,
    control: ScrollControl,
    last_manual_input_ms: Option<u64>,
    pending_forced_scroll: bool,
}

impl ScrollGovernor {
    /// Create a governor with default configuration
    pub fn new() -> Self {
        Self::with_config(GovernorConfig::default())
    }

    /// Create a governor with custom configuration
    pub fn with_config(config: GovernorConfig) -> Self {
        Self {
            config,
            control: ScrollControl::default(),
            last_manual_input_ms: None,
            pending_forced_scroll: false,
        }
    }

    /// Current control state
    pub fn control(&self) -> ScrollControl {
        self.control
    }

    // =========================================================================
    // Input events from the renderer
    // =========================================================================

    /// Record a manual scroll input (drag, wheel, momentum decay).
    ///
    /// Transitions to user control immediately; each further input restarts
    /// the idle window.
    pub fn manual_scroll(&mut self, now_ms: u64) {
        if self.control != ScrollControl::UserControlled {
            debug!("Manual scroll at {}; suspending playback scrolling", now_ms);
        }
        self.control = ScrollControl::UserControlled;
        self.last_manual_input_ms = Some(now_ms);
    }

    /// Record a line click; control reverts immediately and the next
    /// arbitration forces a scroll regardless of the idle window.
    pub fn line_click(&mut self, now_ms: u64) {
        debug!("Line click at {}; returning control to playback", now_ms);
        self.revert();
    }

    /// Record an explicit seek; same handoff as a click.
    pub fn seek(&mut self, now_ms: u64) {
        debug!("Seek at {}; returning control to playback", now_ms);
        self.revert();
    }

    fn revert(&mut self) {
        self.control = ScrollControl::PlayerControlled;
        self.last_manual_input_ms = None;
        self.pending_forced_scroll = true;
    }

    // =========================================================================
    // Arbitration
    // =========================================================================

    /// Decide whether a tick's scroll instruction may be applied.
    ///
    /// `now_ms` is the tick clock, the same monotonically driven sample
    /// rate the engine is ticked with; it is only compared against stored
    /// manual-input timestamps. Highlight state is unaffected by
    /// arbitration; only scrolling is filtered.
    pub fn arbitrate(&mut self, update: &TickUpdate, now_ms: u64) -> Option<ScrollCommand> {
        if self.control == ScrollControl::UserControlled {
            let idle_expired = self
                .last_manual_input_ms
                .is_some_and(|last| now_ms.saturating_sub(last) >= self.config.user_idle_revert_ms);
            if idle_expired {
                debug!("User idle for {} ms; resuming playback scrolling", self.config.user_idle_revert_ms);
                self.revert();
            }
        }

        match self.control {
            ScrollControl::UserControlled => {
                // Scroll requests are computed but suppressed; forced
                // resyncs (seeks) are never suppressed.
                if update.forced_resync {
                    update.scroll
                } else {
                    if update.scroll.is_some() {
                        debug!("Suppressing scroll while user-controlled");
                    }
                    None
                }
            }
            ScrollControl::PlayerControlled => {
                if std::mem::take(&mut self.pending_forced_scroll) {
                    // Force a scroll to the current target even when the
                    // engine emitted no change this tick.
                    update.scroll.or_else(|| {
                        update.scroll_target.map(|line| ScrollCommand {
                            line,
                            animated: !update.forced_resync,
                        })
                    })
                } else {
                    update.scroll
                }
            }
        }
    }
}

impl Default for ScrollGovernor {
    fn default() -> Self {
        Self::new()
    }
}
