/*!
 * Playback-synchronization engine.
 *
 * This module handles:
 * - Mapping a playback-time sample onto the active line set
 * - Choosing the scroll-target line with latency compensation
 * - Driving the per-syllable highlight state machine
 * - Detecting seeks and forcing immediate resynchronization
 *
 * A [`SyncSession`] owns one displayed document and every piece of
 * playback-session state. Sessions are never shared between documents;
 * tearing one down is dropping it.
 */

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::model::{Syllable, TimedDocument};

/// Lead applied when evaluating scroll-target candidacy
const SCROLL_LOOKAHEAD_MS: u64 = 300;

/// Lead applied to highlight-window membership
const HIGHLIGHT_LOOKAHEAD_MS: u64 = 190;

/// Time discontinuity treated as a seek
const SEEK_THRESHOLD_MS: u64 = 1_000;

/// Upper bound on simultaneously active lines
const MAX_ACTIVE_LINES: usize = 3;

/// Configuration for a sync session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Lead in ms for scroll-target evaluation
    pub scroll_lookahead_ms: u64,
    /// Lead in ms for highlight-window evaluation
    pub highlight_lookahead_ms: u64,
    /// Time jump in ms beyond which a tick is treated as a seek
    pub seek_threshold_ms: u64,
    /// Cap on the active-line set
    pub max_active_lines: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            scroll_lookahead_ms: SCROLL_LOOKAHEAD_MS,
            highlight_lookahead_ms: HIGHLIGHT_LOOKAHEAD_MS,
            seek_threshold_ms: SEEK_THRESHOLD_MS,
            max_active_lines: MAX_ACTIVE_LINES,
        }
    }
}

/// Highlight state of a single syllable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyllableState {
    /// Not yet reached
    #[default]
    Idle,
    /// Playback is inside the syllable window
    Highlighted,
    /// Playback has moved past the syllable; keeps its completed look
    Finished,
}

/// A scroll instruction for the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollCommand {
    /// Target line index
    pub line: usize,
    /// Whether the renderer may animate the scroll
    pub animated: bool,
}

/// A syllable state change produced by a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyllableEvent {
    /// Line index the syllable belongs to
    pub line: usize,
    /// Syllable index within the line
    pub syllable: usize,
    /// New state
    pub state: SyllableState,
}

/// Everything a tick decided, as pure data for the renderer
#[derive(Debug, Clone, Default)]
pub struct TickUpdate {
    /// The time sample this update was computed for
    pub time_ms: u64,
    /// True when this tick was a seek or the first tick of the session
    pub forced_resync: bool,
    /// Current active lines, ascending by start
    pub active_lines: Vec<usize>,
    /// Lines newly active this tick
    pub activated: Vec<usize>,
    /// Lines no longer active this tick
    pub deactivated: Vec<usize>,
    /// Current scroll-target line (state, recomputed every tick)
    pub scroll_target: Option<usize>,
    /// Scroll instruction (event, only on target change or forced resync)
    pub scroll: Option<ScrollCommand>,
    /// Syllable state changes this tick
    pub syllable_events: Vec<SyllableEvent>,
}

impl TickUpdate {
    /// Whether the tick changed nothing the renderer needs to act on
    pub fn is_quiet(&self) -> bool {
        self.activated.is_empty()
            && self.deactivated.is_empty()
            && self.scroll.is_none()
            && self.syllable_events.is_empty()
    }

    /// Replay this update into a renderer capability sink
    pub fn apply(&self, sink: &mut dyn RenderSink) {
        for &line in &self.deactivated {
            sink.deactivate_line(line);
        }
        for &line in &self.activated {
            sink.activate_line(line);
        }
        for event in &self.syllable_events {
            match event.state {
                SyllableState::Idle => sink.reset_syllable(event.line, event.syllable),
                SyllableState::Highlighted | SyllableState::Finished => {
                    sink.highlight_syllable(event.line, event.syllable)
                }
            }
        }
        if let Some(command) = self.scroll {
            sink.scroll_to(command.line, command.animated);
        }
    }
}

/// Capability interface a renderer exposes to consume tick output
pub trait RenderSink {
    /// A line entered the active set
    fn activate_line(&mut self, line: usize);
    /// A line left the active set
    fn deactivate_line(&mut self, line: usize);
    /// A syllable reached its highlighted or finished look
    fn highlight_syllable(&mut self, line: usize, syllable: usize);
    /// A syllable returned to idle
    fn reset_syllable(&mut self, line: usize, syllable: usize);
    /// Bring a line into view
    fn scroll_to(&mut self, line: usize, animated: bool);
}

/// Session state for one actively displayed document
pub struct SyncSession {
    /// The document being displayed; read-only from here on
    document: TimedDocument,
    config: SyncConfig,
    last_time_ms: Option<u64>,
    active: Vec<usize>,
    syllable_states: HashMap<(usize, usize), SyllableState>,
    last_scroll_target: Option<usize>,
}

impl SyncSession {
    /// Create a session with default configuration
    pub fn new(document: TimedDocument) -> Self {
        Self::with_config(document, SyncConfig::default())
    }

    /// Create a session with custom configuration
    pub fn with_config(document: TimedDocument, config: SyncConfig) -> Self {
        Self {
            document,
            config,
            last_time_ms: None,
            active: Vec::new(),
            syllable_states: HashMap::new(),
            last_scroll_target: None,
        }
    }

    /// The displayed document
    pub fn document(&self) -> &TimedDocument {
        &self.document
    }

    /// The session configuration
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Tear the session down, handing the document back
    pub fn into_document(self) -> TimedDocument {
        self.document
    }

    /// Current active lines, ascending by start
    pub fn active_lines(&self) -> &[usize] {
        &self.active
    }

    /// Absolute state of one syllable; idle for anything not tracked
    pub fn syllable_state(&self, line: usize, syllable: usize) -> SyllableState {
        self.syllable_states.get(&(line, syllable)).copied().unwrap_or_default()
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// Advance the session to a playback-time sample.
    ///
    /// Safe to call once per rendering tick whether or not time advanced:
    /// repeated calls with an unchanged time produce a quiet update rather
    /// than re-emitting already-applied changes. Time may jump
    /// non-monotonically; jumps beyond the seek threshold force a full
    /// resync with an instant, unanimated scroll.
    pub fn tick(&mut self, time_ms: u64) -> TickUpdate {
        let forced_resync = match self.last_time_ms {
            None => true,
            Some(last) => time_ms.abs_diff(last) > self.config.seek_threshold_ms,
        };
        if forced_resync {
            debug!(
                "Forced resync at {} (previous sample {:?})",
                time_ms, self.last_time_ms
            );
        }
        self.last_time_ms = Some(time_ms);

        let active_lines = self.compute_active(time_ms);
        let scroll_target = self.compute_scroll_target(time_ms);

        let activated: Vec<usize> = active_lines
            .iter()
            .copied()
            .filter(|line| !self.active.contains(line))
            .collect();
        let deactivated: Vec<usize> = self
            .active
            .iter()
            .copied()
            .filter(|line| !active_lines.contains(line))
            .collect();

        let mut syllable_events = Vec::new();

        // Syllables of deactivated lines go back to idle.
        for &line in &deactivated {
            let count = self.document.lines[line].syllables.len();
            for syllable in 0..count {
                if let Some(state) = self.syllable_states.remove(&(line, syllable)) {
                    if state != SyllableState::Idle {
                        syllable_events.push(SyllableEvent {
                            line,
                            syllable,
                            state: SyllableState::Idle,
                        });
                    }
                }
            }
        }

        // Syllable state is recomputed every tick, but only for syllables
        // belonging to currently active lines.
        for &line in &active_lines {
            for (syllable, timing) in self.document.lines[line].syllables.iter().enumerate() {
                let current = self
                    .syllable_states
                    .get(&(line, syllable))
                    .copied()
                    .unwrap_or_default();
                let next = syllable_state_at(timing, time_ms);
                if next != current {
                    self.syllable_states.insert((line, syllable), next);
                    syllable_events.push(SyllableEvent { line, syllable, state: next });
                }
            }
        }

        let scroll = if forced_resync || scroll_target != self.last_scroll_target {
            scroll_target.map(|line| ScrollCommand { line, animated: !forced_resync })
        } else {
            None
        };
        self.last_scroll_target = scroll_target;
        self.active = active_lines.clone();

        TickUpdate {
            time_ms,
            forced_resync,
            active_lines,
            activated,
            deactivated,
            scroll_target,
            scroll,
            syllable_events,
        }
    }

    // =========================================================================
    // Rules
    // =========================================================================

    /// All lines whose lookahead-adjusted window contains `time_ms`,
    /// capped to the most recent by start, ascending by start.
    fn compute_active(&self, time_ms: u64) -> Vec<usize> {
        let lookahead = self.config.highlight_lookahead_ms;
        let mut candidates: Vec<usize> = self
            .document
            .lines
            .iter()
            .enumerate()
            .filter(|(_, line)| {
                let window_start = line.start_ms.saturating_sub(lookahead);
                let window_end = line.end_ms.saturating_sub(lookahead);
                time_ms >= window_start && time_ms < window_end
            })
            .map(|(index, _)| index)
            .collect();

        // Lines are sorted by start, so the most recent candidates are the
        // trailing ones.
        if candidates.len() > self.config.max_active_lines {
            candidates.drain(..candidates.len() - self.config.max_active_lines);
        }
        candidates
    }

    /// The line the view should be scrolled to at `time_ms`.
    fn compute_scroll_target(&self, time_ms: u64) -> Option<usize> {
        let lines = &self.document.lines;
        if lines.is_empty() {
            return None;
        }

        let predictive = time_ms.saturating_add(self.config.scroll_lookahead_ms);

        // Latest-starting line whose window contains the predictive time;
        // ties keep the first in original order.
        let mut best: Option<usize> = None;
        for (index, line) in lines.iter().enumerate() {
            if line.contains(predictive) {
                let replaces = match best {
                    Some(current) => line.start_ms > lines[current].start_ms,
                    None => true,
                };
                if replaces {
                    best = Some(index);
                }
            }
        }
        if best.is_some() {
            return best;
        }

        // Mid-gap: fall back to the most recent line fully behind the
        // sample, or the first line before playback starts.
        let floor = time_ms.saturating_sub(self.config.scroll_lookahead_ms);
        lines
            .iter()
            .enumerate()
            .rev()
            .find(|(_, line)| line.start_ms <= floor)
            .map(|(index, _)| index)
            .or(Some(0))
    }
}

/// Pure syllable state for a time sample.
///
/// Idle before the window, highlighted inside `[start, end]`, finished
/// past it. Moving time backwards below the start is what returns a
/// finished syllable to idle.
fn syllable_state_at(syllable: &Syllable, time_ms: u64) -> SyllableState {
    if time_ms < syllable.start_ms {
        SyllableState::Idle
    } else if time_ms <= syllable.end_ms() {
        SyllableState::Highlighted
    } else {
        SyllableState::Finished
    }
}
