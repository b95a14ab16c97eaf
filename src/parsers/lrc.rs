use once_cell::sync::Lazy;
use regex::Regex;
use log::debug;

use crate::errors::ParseError;
use crate::model::{
    clamp_ms, DocumentKind, DocumentMetadata, Line, LyricSource, Syllable, TimedDocument,
};

// @module: LRC and Enhanced LRC parsing

// @const: Duration granted to the final line when no successor bounds it
const DEFAULT_LAST_LINE_DURATION_MS: u64 = 5_000;

// @const: Leading line-timestamp tag, [mm:ss.xx] with 1-3 fraction digits
static LINE_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(\d+):(\d{1,2})(?:[.:](\d{1,3}))?\]").unwrap()
});

// @const: Inline word-timestamp tag, <mm:ss.xx>
static INLINE_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(\d+):(\d{1,2})(?:[.:](\d{1,3}))?>").unwrap()
});

// @const: Offset control tag, applied negated to every timestamp
static OFFSET_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\[offset:\s*([+-]?\d+)\s*\]$").unwrap()
});

// @const: ID tags carrying document metadata, e.g. [ti:...] [ar:...]
static ID_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[([A-Za-z#]{2,}):(.*)\]$").unwrap()
});

// @const: Known speaker/background markers, stripped from line text
static SPEAKER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\[(v1|v2|v3|m|f|d|duet|male|female|bg)\]\s*").unwrap()
});

/// A line as collected before durations are known.
struct RawEntry {
    start_ms: u64,
    text: String,
    syllables: Vec<RawSyllable>,
    speaker: Option<String>,
    background: bool,
}

/// A syllable whose trailing duration may still be unresolved.
#[derive(Clone)]
struct RawSyllable {
    text: String,
    start_ms: u64,
    duration_ms: Option<u64>,
}

/// Parse LRC or Enhanced LRC content into a timed document.
///
/// Returns `None` when the content carries no timed lines at all, which
/// callers treat as "lyrics not found" rather than an error. Malformed tag
/// groups are simply not matched; lines without any timestamp are ignored
/// (metadata ID tags aside).
pub fn parse(content: &str) -> Option<TimedDocument> {
    let offset_ms = scan_offset(content);

    let mut metadata = DocumentMetadata {
        source: LyricSource::Lrc,
        ..DocumentMetadata::default()
    };
    let mut raw_entries: Vec<RawEntry> = Vec::new();

    for source_line in content.lines() {
        let trimmed = source_line.trim();
        if trimmed.is_empty() {
            continue;
        }

        // Collect every leading timestamp tag (compressed form shares text).
        let mut starts: Vec<u64> = Vec::new();
        let mut rest = trimmed;
        while let Some(caps) = LINE_TAG_REGEX.captures(rest) {
            let tag_ms = captures_to_ms(&caps);
            starts.push(clamp_ms(tag_ms as i64 + offset_ms));
            rest = &rest[caps.get(0).map_or(0, |m| m.end())..];
        }

        if starts.is_empty() {
            if OFFSET_REGEX.is_match(trimmed) {
                continue;
            }
            if let Some(caps) = ID_TAG_REGEX.captures(trimmed) {
                apply_id_tag(&mut metadata, &caps[1], caps[2].trim());
            }
            continue;
        }

        let (speaker, background, body) = strip_speaker(rest);
        let (text, syllables) = parse_inline_timing(body, starts[0], offset_ms);

        for &start_ms in &starts {
            raw_entries.push(RawEntry {
                start_ms,
                text: text.clone(),
                syllables: syllables.clone(),
                speaker: speaker.clone(),
                background,
            });
        }
    }

    if raw_entries.is_empty() {
        debug!("No timed lines found in LRC content");
        return None;
    }

    // Sort by start time; a stable sort keeps compressed-tag siblings in
    // their source order on equal starts.
    raw_entries.sort_by_key(|e| e.start_ms);

    let enhanced = raw_entries.iter().any(|e| !e.syllables.is_empty());
    let mut lines = Vec::with_capacity(raw_entries.len());

    for index in 0..raw_entries.len() {
        let end_ms = match raw_entries.get(index + 1) {
            Some(next) => next.start_ms.max(raw_entries[index].start_ms),
            None => raw_entries[index].start_ms + DEFAULT_LAST_LINE_DURATION_MS,
        };
        let entry = &raw_entries[index];

        let mut line = Line::new(entry.start_ms, end_ms, entry.text.clone());
        line.speaker = entry.speaker.clone();
        line.syllables = resolve_syllables(&entry.syllables, end_ms, entry.background);
        lines.push(line);
    }

    // Empty lines have now contributed their start as a neighbor boundary
    // and can be discarded.
    lines.retain(|line| !line.text.trim().is_empty());

    if lines.is_empty() {
        return None;
    }

    if enhanced {
        metadata.source = LyricSource::EnhancedLrc;
    }

    Some(TimedDocument {
        kind: if enhanced { DocumentKind::Word } else { DocumentKind::Line },
        metadata,
        lines,
    })
}

/// Parse a single `mm:ss.xx` timestamp string to milliseconds.
///
/// Strict variant used by tests and external consumers; the lenient regex
/// path inside [`parse`] never raises.
pub fn parse_timestamp(timestamp: &str) -> Result<u64, ParseError> {
    let bracketed = format!("[{}]", timestamp.trim());
    let caps = LINE_TAG_REGEX
        .captures(&bracketed)
        .ok_or_else(|| ParseError::MalformedTimestamp(timestamp.to_string()))?;

    let seconds: u64 = caps[2].parse().unwrap_or(0);
    if seconds >= 60 {
        return Err(ParseError::MalformedTimestamp(timestamp.to_string()));
    }

    Ok(captures_to_ms(&caps))
}

/// Scan every line for an `[offset:N]` marker; the first match wins.
///
/// The tag's value is applied negated: `[offset:200]` shifts every
/// timestamp by -200 ms. This matches the behavior lyric players exhibit
/// in the wild and is pinned by a regression test.
fn scan_offset(content: &str) -> i64 {
    content
        .lines()
        .find_map(|line| OFFSET_REGEX.captures(line.trim()))
        .and_then(|caps| caps[1].parse::<i64>().ok())
        .map(|n| -n)
        .unwrap_or(0)
}

/// Convert a matched timestamp tag into milliseconds.
fn captures_to_ms(caps: &regex::Captures) -> u64 {
    let minutes: u64 = caps.get(1).map_or(0, |m| m.as_str().parse().unwrap_or(0));
    let seconds: u64 = caps.get(2).map_or(0, |m| m.as_str().parse().unwrap_or(0));
    let fraction = caps.get(3).map_or(0, |m| fraction_to_ms(m.as_str()));

    minutes * 60_000 + seconds * 1_000 + fraction
}

/// Scale a 1-3 digit fraction field to milliseconds.
fn fraction_to_ms(digits: &str) -> u64 {
    let value: u64 = digits.parse().unwrap_or(0);
    match digits.len() {
        1 => value * 100,
        2 => value * 10,
        _ => value,
    }
}

/// Strip a known speaker marker from the head of a line body.
fn strip_speaker(body: &str) -> (Option<String>, bool, &str) {
    if let Some(caps) = SPEAKER_REGEX.captures(body) {
        let token = caps[1].to_lowercase();
        let rest = &body[caps.get(0).map_or(0, |m| m.end())..];
        let background = token == "bg";
        return (Some(token), background, rest);
    }
    (None, false, body)
}

/// Split a line body on inline `<mm:ss.xx>` tags into syllable runs.
///
/// Text preceding the first tag starts at the line's own timestamp. A
/// trailing tag with no text after it closes the previous syllable instead
/// of opening an empty one. The final syllable's duration stays unresolved
/// until the line's overall end is known.
fn parse_inline_timing(
    body: &str,
    line_start_ms: u64,
    offset_ms: i64,
) -> (String, Vec<RawSyllable>) {
    let matches: Vec<regex::Captures> = INLINE_TAG_REGEX.captures_iter(body).collect();
    let text = INLINE_TAG_REGEX.replace_all(body, "").to_string();

    if matches.is_empty() {
        return (text, Vec::new());
    }

    let mut syllables: Vec<RawSyllable> = Vec::new();

    let first_start = matches[0].get(0).map_or(0, |m| m.start());
    let prefix = &body[..first_start];
    if !prefix.trim().is_empty() {
        syllables.push(RawSyllable {
            text: prefix.to_string(),
            start_ms: line_start_ms,
            duration_ms: None,
        });
    }

    for (index, caps) in matches.iter().enumerate() {
        let tag_end = caps.get(0).map_or(0, |m| m.end());
        let run_end = matches
            .get(index + 1)
            .and_then(|next| next.get(0))
            .map_or(body.len(), |m| m.start());
        let run = &body[tag_end..run_end];
        let start_ms = clamp_ms(captures_to_ms(caps) as i64 + offset_ms);

        if run.trim().is_empty() {
            // A bare trailing tag marks the end of the previous run.
            if let Some(prev) = syllables.last_mut() {
                if prev.duration_ms.is_none() {
                    prev.duration_ms = Some(start_ms.saturating_sub(prev.start_ms));
                }
            }
            continue;
        }

        if let Some(prev) = syllables.last_mut() {
            if prev.duration_ms.is_none() {
                prev.duration_ms = Some(start_ms.saturating_sub(prev.start_ms));
            }
        }

        syllables.push(RawSyllable {
            text: run.to_string(),
            start_ms,
            duration_ms: None,
        });
    }

    (text, syllables)
}

/// Finalize syllables once the line's end boundary is known.
fn resolve_syllables(raw: &[RawSyllable], line_end_ms: u64, background: bool) -> Vec<Syllable> {
    let count = raw.len();
    raw.iter()
        .enumerate()
        .map(|(index, r)| {
            let duration_ms = r
                .duration_ms
                .unwrap_or_else(|| line_end_ms.saturating_sub(r.start_ms));
            let mut syllable = Syllable::new(r.text.clone(), r.start_ms, duration_ms);
            syllable.is_background = background;
            syllable.is_line_ending = index + 1 == count;
            syllable
        })
        .collect()
}

/// Fold a recognized ID tag into document metadata.
fn apply_id_tag(metadata: &mut DocumentMetadata, key: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    match key.to_lowercase().as_str() {
        "ti" => metadata.title = Some(value.to_string()),
        "la" => metadata.language = Some(value.to_string()),
        "ar" | "au" => metadata.song_writers.push(value.to_string()),
        other => debug!("Ignoring LRC ID tag [{}:...]", other),
    }
}
