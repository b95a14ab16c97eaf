/*!
 * Tests for LRC and Enhanced LRC parsing
 */

use lyrisync::model::{DocumentKind, LyricSource};
use lyrisync::parsers::lrc;

#[test]
fn test_parse_withTwoTimedLines_shouldDeriveDurationsFromSuccessors() {
    let document = lrc::parse("[00:01.00]Hello\n[00:03.00]World").unwrap();

    assert_eq!(document.kind, DocumentKind::Line);
    assert_eq!(document.lines.len(), 2);

    assert_eq!(document.lines[0].start_ms, 1000);
    assert_eq!(document.lines[0].end_ms, 3000);
    assert_eq!(document.lines[0].text, "Hello");

    // The final line gets the fixed fallback duration.
    assert_eq!(document.lines[1].start_ms, 3000);
    assert_eq!(document.lines[1].end_ms, 8000);
    assert_eq!(document.lines[1].text, "World");
}

#[test]
fn test_parse_withInlineWordTags_shouldProduceSyllables() {
    let document = lrc::parse("[00:01.00]<00:01.00>Hel<00:01.50>lo").unwrap();

    assert_eq!(document.kind, DocumentKind::Word);
    assert_eq!(document.metadata.source, LyricSource::EnhancedLrc);

    let line = &document.lines[0];
    assert_eq!(line.text, "Hello");
    assert_eq!(line.syllables.len(), 2);

    assert_eq!(line.syllables[0].text, "Hel");
    assert_eq!(line.syllables[0].start_ms, 1000);
    assert_eq!(line.syllables[0].duration_ms, 500);

    // Trailing syllable duration comes from the line's end boundary
    // (start + the 5000 ms last-line fallback).
    assert_eq!(line.syllables[1].text, "lo");
    assert_eq!(line.syllables[1].start_ms, 1500);
    assert_eq!(line.syllables[1].duration_ms, 4500);
    assert!(line.syllables[1].is_line_ending);
}

#[test]
fn test_parse_withOffsetTag_shouldApplyNegatedOffset() {
    // Regression pin: the offset value is applied negated, matching the
    // behavior players exhibit rather than the format's prose convention.
    let document = lrc::parse("[offset:200]\n[00:10.00]Test").unwrap();

    assert_eq!(document.lines[0].start_ms, 9_800);
}

#[test]
fn test_parse_withNegativeOffset_shouldShiftForward() {
    let document = lrc::parse("[offset:-200]\n[00:10.00]Test").unwrap();

    assert_eq!(document.lines[0].start_ms, 10_200);
}

#[test]
fn test_parse_withOffsetLargerThanTimestamp_shouldClampToZero() {
    let document = lrc::parse("[offset:5000]\n[00:01.00]Early").unwrap();

    assert_eq!(document.lines[0].start_ms, 0);
}

#[test]
fn test_parse_withCompressedTimestamps_shouldEmitOneEntryPerTag() {
    let document =
        lrc::parse("[00:10.00][00:20.00]Chorus\n[00:15.00]Middle").unwrap();

    let texts: Vec<&str> = document.lines.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, vec!["Chorus", "Middle", "Chorus"]);

    assert_eq!(document.lines[0].end_ms, 15_000);
    assert_eq!(document.lines[1].end_ms, 20_000);
    assert_eq!(document.lines[2].end_ms, 25_000);
}

#[test]
fn test_parse_withEmptyTimedLine_shouldDropItAfterDurationMath() {
    let document = lrc::parse("[00:01.00]A\n[00:03.00]\n[00:10.00]B").unwrap();

    assert_eq!(document.lines.len(), 2);
    // The empty line still bounded A's duration before being dropped.
    assert_eq!(document.lines[0].end_ms, 3_000);
    assert_eq!(document.lines[1].start_ms, 10_000);
}

#[test]
fn test_parse_withSpeakerToken_shouldStripAndRecordSpeaker() {
    let document = lrc::parse("[00:05.00][D]Duet line").unwrap();

    assert_eq!(document.lines[0].speaker.as_deref(), Some("d"));
    assert_eq!(document.lines[0].text, "Duet line");
}

#[test]
fn test_parse_withBackgroundMarker_shouldFlagSyllables() {
    let document = lrc::parse("[00:02.00][bg]<00:02.00>Ooh").unwrap();

    let line = &document.lines[0];
    assert_eq!(line.speaker.as_deref(), Some("bg"));
    assert!(line.syllables[0].is_background);
}

#[test]
fn test_parse_withTrailingBareTag_shouldCloseLastSyllable() {
    let document = lrc::parse("[00:01.00]<00:01.00>Hi<00:02.00>").unwrap();

    let line = &document.lines[0];
    assert_eq!(line.syllables.len(), 1);
    assert_eq!(line.syllables[0].duration_ms, 1_000);
}

#[test]
fn test_parse_withTextBeforeFirstInlineTag_shouldStartAtLineTime() {
    let document = lrc::parse("[00:01.00]Oh <00:02.00>yeah").unwrap();

    let line = &document.lines[0];
    assert_eq!(line.syllables[0].text, "Oh ");
    assert_eq!(line.syllables[0].start_ms, 1_000);
    assert_eq!(line.syllables[0].duration_ms, 1_000);
    assert_eq!(line.syllables[1].start_ms, 2_000);
}

#[test]
fn test_parse_withIdTags_shouldCollectMetadata() {
    let document = lrc::parse(crate::common::sample_lrc()).unwrap();

    assert_eq!(document.metadata.title.as_deref(), Some("Test Song"));
    assert_eq!(document.metadata.song_writers, vec!["Test Writer".to_string()]);
    assert_eq!(document.lines.len(), 3);
}

#[test]
fn test_parse_withUnorderedInput_shouldSortByStart() {
    let document = lrc::parse("[00:10.00]B\n[00:01.00]A").unwrap();

    assert!(document.is_sorted_by_start());
    assert_eq!(document.lines[0].text, "A");
    assert_eq!(document.lines[0].end_ms, 10_000);
}

#[test]
fn test_parse_withShortFractionDigits_shouldScaleToMilliseconds() {
    let document = lrc::parse("[00:01.5]X\n[00:02.50]Y\n[00:03.500]Z").unwrap();

    assert_eq!(document.lines[0].start_ms, 1_500);
    assert_eq!(document.lines[1].start_ms, 2_500);
    assert_eq!(document.lines[2].start_ms, 3_500);
}

#[test]
fn test_parse_withNoTimestamps_shouldReturnNone() {
    assert!(lrc::parse("just text\nmore text").is_none());
    assert!(lrc::parse("").is_none());
}

#[test]
fn test_parse_withMalformedTags_shouldIgnoreThem() {
    let document = lrc::parse("[12:ab.cd]broken\n[00:01.00]Good").unwrap();

    assert_eq!(document.lines.len(), 1);
    assert_eq!(document.lines[0].text, "Good");
}

#[test]
fn test_parseTimestamp_withValidInput_shouldReturnMilliseconds() {
    assert_eq!(lrc::parse_timestamp("01:23.45").unwrap(), 83_450);
    assert_eq!(lrc::parse_timestamp("00:00.00").unwrap(), 0);
}

#[test]
fn test_parseTimestamp_withInvalidInput_shouldFail() {
    assert!(lrc::parse_timestamp("not a timestamp").is_err());
    assert!(lrc::parse_timestamp("01:75.00").is_err());
}
