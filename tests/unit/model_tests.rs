/*!
 * Tests for the canonical timed-lyric model
 */

use lyrisync::model::{
    format_timestamp, DocumentKind, Line, LyricSource, SideText, Syllable, TimedDocument,
};
use crate::common;

#[test]
fn test_document_withJsonRoundTrip_shouldPreserveEverything() {
    let mut document = TimedDocument::new(DocumentKind::Word, LyricSource::Ttml);
    document.metadata.title = Some("Song".to_string());

    let mut line = Line::new(1000, 3000, "Hello world".to_string());
    line.syllables.push(Syllable::new("Hello ".to_string(), 1000, 500));
    line.translation = Some(SideText::plain(Some("de".to_string()), "Hallo Welt".to_string()));
    document.lines.push(line);

    let json = document.to_json().unwrap();
    let back: TimedDocument = serde_json::from_str(&json).unwrap();

    assert_eq!(back, document);
}

#[test]
fn test_isSortedByStart_withOrderedLines_shouldHold() {
    let document = common::document_from_spans(&[(0, 1000, "A"), (1000, 2000, "B")]);

    assert!(document.is_sorted_by_start());
}

#[test]
fn test_isSortedByStart_withDisorderedLines_shouldFail() {
    let document = common::document_from_spans(&[(5000, 6000, "B"), (0, 1000, "A")]);

    assert!(!document.is_sorted_by_start());
}

#[test]
fn test_lineNew_shouldKeepNaturalEndInSyncInitially() {
    let line = Line::new(100, 900, "text".to_string());

    assert_eq!(line.end_ms, line.natural_end_ms);
    assert_eq!(line.duration_ms(), 800);
}

#[test]
fn test_lineDisplay_shouldRenderTimestampsAndText() {
    let line = Line::new(61_000, 63_500, "Hello".to_string());

    let rendered = format!("{}", line);

    assert!(rendered.contains("01:01.000"));
    assert!(rendered.contains("01:03.500"));
    assert!(rendered.contains("Hello"));
}

#[test]
fn test_formatTimestamp_shouldUseMinutesSecondsMillis() {
    assert_eq!(format_timestamp(754_321), "12:34.321");
}

#[test]
fn test_documentDisplay_shouldSummarize() {
    let mut document = common::document_from_spans(&[(0, 1000, "A")]);
    document.metadata.title = Some("My Song".to_string());

    let rendered = format!("{}", document);

    assert!(rendered.contains("My Song"));
    assert!(rendered.contains("Lines: 1"));
}
