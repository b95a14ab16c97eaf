/*!
 * Real-time synchronization of a timed document against playback.
 *
 * - `engine`: the per-document [`SyncSession`] producing pure
 *   [`TickUpdate`] data each tick
 * - `scroll`: the [`ScrollGovernor`] arbitrating playback-driven vs
 *   user-driven scrolling
 */

pub mod engine;
pub mod scroll;

pub use engine::{
    RenderSink, ScrollCommand, SyllableEvent, SyllableState, SyncConfig, SyncSession, TickUpdate,
};
pub use scroll::{GovernorConfig, ScrollControl, ScrollGovernor};
