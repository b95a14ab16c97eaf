/*!
 * # lyrisync - Lyric parsing and playback synchronization
 *
 * A Rust library for turning time-synchronized lyric documents into a
 * canonical timed model and driving real-time highlight/scroll state
 * from a playback clock.
 *
 * ## Features
 *
 * - Parse LRC, Enhanced LRC (inline word timing), and TTML lyric sources
 * - Speaker/background markup, translations, and transliterations
 * - Retiming pass that smooths overlapping and gapped line boundaries
 * - Latency-compensated sync engine with per-syllable highlight state
 * - Scroll arbitration between playback and manual user scrolling
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `model`: The canonical TimedDocument/Line/Syllable data model
 * - `parsers`: Format parsers and auto-detection:
 *   - `parsers::lrc`: LRC and Enhanced LRC
 *   - `parsers::ttml`: namespaced timed-text markup
 * - `retime`: Post-parse line-boundary retiming
 * - `sync`: Playback synchronization:
 *   - `sync::engine`: per-document sessions producing tick updates
 *   - `sync::scroll`: playback/user scroll arbitration
 * - `errors`: Custom error types for the crate
 *
 * The core performs no I/O of its own: callers hand parsers a string and
 * tick sessions with a time sample; renderers consume pure update data.
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod errors;
pub mod model;
pub mod parsers;
pub mod retime;
pub mod sync;

// Re-export main types for easier usage
pub use errors::{AppError, ParseError, SyncError};
pub use model::{DocumentKind, Line, LyricSource, Syllable, TimedDocument};
pub use parsers::parse_auto;
pub use retime::{RetimeConfig, Retimer};
pub use sync::{
    RenderSink, ScrollControl, ScrollGovernor, SyllableState, SyncConfig, SyncSession, TickUpdate,
};
