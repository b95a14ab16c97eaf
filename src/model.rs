use std::collections::HashMap;
use std::fmt;
use serde::{Deserialize, Serialize};

// @module: Canonical timed-lyric model shared by parsers and the sync engine

/// Timing granularity of a parsed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Only line-level timing is available.
    #[default]
    Line,
    /// Per-syllable (word) timing is available on at least some lines.
    Word,
}

/// Source format a document was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LyricSource {
    /// Plain line-timed LRC.
    #[default]
    Lrc,
    /// LRC with inline per-word tags.
    EnhancedLrc,
    /// Timed-text markup (word- or line-timed).
    Ttml,
}

impl fmt::Display for LyricSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lrc => write!(f, "lrc"),
            Self::EnhancedLrc => write!(f, "enhanced-lrc"),
            Self::Ttml => write!(f, "ttml"),
        }
    }
}

/// Kind of a credited agent (singer, group) named in document metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    #[default]
    Person,
    Group,
    Other,
}

impl AgentKind {
    /// Map a TTML `type` attribute value onto an agent kind.
    pub fn from_type_attr(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "person" => Self::Person,
            "group" | "organization" => Self::Group,
            _ => Self::Other,
        }
    }
}

/// A credited agent referenced by per-line speaker ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    // @field: Agent kind
    pub kind: AgentKind,

    // @field: Display name, when the source provides one
    pub name: Option<String>,
}

/// Document-level metadata collected during parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DocumentMetadata {
    /// Format the document came from.
    pub source: LyricSource,

    /// Song title, when the source carries one.
    pub title: Option<String>,

    /// Primary language code, as found in the source (opaque string).
    pub language: Option<String>,

    /// Credited songwriters, in source order.
    pub song_writers: Vec<String>,

    /// Agents addressable from per-line speaker ids.
    pub agents: HashMap<String, Agent>,

    /// Named song parts (verse, chorus, ...) in source order.
    pub song_parts: Vec<String>,
}

/// Side-channel text attached to a line (translation or transliteration).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideText {
    /// Language code of the side text, when declared.
    pub lang: Option<String>,

    /// Full text of the side channel.
    pub text: String,

    /// Per-syllable timing, only ever populated on transliterations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub syllables: Option<Vec<Syllable>>,
}

impl SideText {
    /// Create an untimed side text.
    pub fn plain(lang: Option<String>, text: String) -> Self {
        Self { lang, text, syllables: None }
    }
}

/// The smallest timed text unit in word-level lyrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Syllable {
    // @field: Syllable text, spacing preserved
    pub text: String,

    // @field: Start time in ms
    pub start_ms: u64,

    // @field: Duration in ms
    pub duration_ms: u64,

    // @field: Belongs to a background vocal run
    pub is_background: bool,

    // @field: Last syllable of its line
    pub is_line_ending: bool,
}

impl Syllable {
    /// Create a new syllable.
    pub fn new(text: String, start_ms: u64, duration_ms: u64) -> Self {
        Self {
            text,
            start_ms,
            duration_ms,
            is_background: false,
            is_line_ending: false,
        }
    }

    /// End time of the syllable in ms.
    pub fn end_ms(&self) -> u64 {
        self.start_ms.saturating_add(self.duration_ms)
    }
}

/// A single timed lyric line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    // @field: Start time in ms
    pub start_ms: u64,

    // @field: Presentation end time in ms (retiming writes here)
    pub end_ms: u64,

    // @field: Source-provided end time in ms, never retimed
    pub natural_end_ms: u64,

    // @field: Full line text
    pub text: String,

    // @field: Per-syllable timing, empty for line-timed documents
    pub syllables: Vec<Syllable>,

    /// Speaker id (joins `DocumentMetadata::agents`) or a raw marker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,

    /// Index into `DocumentMetadata::song_parts`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song_part: Option<usize>,

    /// Translation side channel, when the source provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<SideText>,

    /// Transliteration side channel, when the source provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transliteration: Option<SideText>,
}

impl Line {
    /// Create a new line; `natural_end_ms` starts equal to `end_ms`.
    pub fn new(start_ms: u64, end_ms: u64, text: String) -> Self {
        Self {
            start_ms,
            end_ms,
            natural_end_ms: end_ms,
            text,
            syllables: Vec::new(),
            speaker: None,
            song_part: None,
            translation: None,
            transliteration: None,
        }
    }

    /// Presentation duration in ms.
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// Whether `time_ms` falls inside the presentation window `[start, end)`.
    pub fn contains(&self, time_ms: u64) -> bool {
        time_ms >= self.start_ms && time_ms < self.end_ms
    }

    /// Whether this line carries per-syllable timing.
    pub fn is_word_timed(&self) -> bool {
        !self.syllables.is_empty()
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} --> {}] {}",
            format_timestamp(self.start_ms),
            format_timestamp(self.end_ms),
            self.text
        )
    }
}

/// Canonical parse result: ordered timed lines plus document metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TimedDocument {
    /// Timing granularity.
    pub kind: DocumentKind,

    /// Document-level metadata.
    pub metadata: DocumentMetadata,

    /// Lines sorted ascending by `start_ms`.
    pub lines: Vec<Line>,
}

impl TimedDocument {
    /// Create an empty document for the given source format.
    pub fn new(kind: DocumentKind, source: LyricSource) -> Self {
        Self {
            kind,
            metadata: DocumentMetadata { source, ..DocumentMetadata::default() },
            lines: Vec::new(),
        }
    }

    /// Whether the document carries no lines at all.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Check the ordering invariant on `lines`.
    pub fn is_sorted_by_start(&self) -> bool {
        self.lines.windows(2).all(|w| w[0].start_ms <= w[1].start_ms)
    }

    /// Serialize the document to a JSON tree for downstream consumers.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for TimedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Timed Document ({})", self.metadata.source)?;
        if let Some(title) = &self.metadata.title {
            writeln!(f, "Title: {}", title)?;
        }
        writeln!(f, "Kind: {:?}", self.kind)?;
        writeln!(f, "Lines: {}", self.lines.len())?;
        Ok(())
    }
}

/// Format a millisecond timestamp as `MM:SS.mmm` for logs and summaries.
pub fn format_timestamp(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    format!("{:02}:{:02}.{:03}", minutes, seconds, millis)
}

/// Clamp a possibly negative millisecond value onto the model's u64 domain.
pub fn clamp_ms(value: i64) -> u64 {
    value.max(0) as u64
}
