/*!
 * Tests for TTML parsing
 */

use lyrisync::model::{AgentKind, DocumentKind};
use lyrisync::parsers::ttml::{self, parse_clock_value, TtmlParseOptions};
use crate::common;

#[test]
fn test_parse_withWordTimedDocument_shouldProduceSyllables() {
    let document = ttml::parse(common::sample_ttml()).unwrap();

    assert_eq!(document.kind, DocumentKind::Word);
    assert_eq!(document.lines.len(), 2);

    let line = &document.lines[0];
    assert_eq!(line.start_ms, 1_000);
    assert_eq!(line.end_ms, 3_000);
    assert_eq!(line.text, "Hello world");

    // Trailing whitespace between spans is appended to the preceding span.
    assert_eq!(line.syllables[0].text, "Hello ");
    assert_eq!(line.syllables[0].start_ms, 1_000);
    assert_eq!(line.syllables[0].duration_ms, 500);
    assert_eq!(line.syllables[1].text, "world");
}

#[test]
fn test_parse_withBackgroundWrapper_shouldFlattenOneLevelWithoutDoubleCounting() {
    let document = ttml::parse(common::sample_ttml()).unwrap();

    let line = &document.lines[0];
    // Two foreground runs plus one background run; the wrapper span itself
    // is not counted.
    assert_eq!(line.syllables.len(), 3);
    assert!(line.syllables[2].is_background);
    assert_eq!(line.syllables[2].text, "(ooh)");
    assert!(line.syllables[2].is_line_ending);
    assert!(!line.syllables[0].is_background);
}

#[test]
fn test_parse_withMetadataBlock_shouldCollectAgentsAndWriters() {
    let document = ttml::parse(common::sample_ttml()).unwrap();

    let agent = document.metadata.agents.get("v1").unwrap();
    assert_eq!(agent.kind, AgentKind::Person);
    assert_eq!(agent.name.as_deref(), Some("Lead"));

    assert_eq!(document.metadata.song_writers, vec!["A. Writer".to_string()]);
    assert_eq!(document.metadata.language.as_deref(), Some("en"));
    assert_eq!(document.lines[0].speaker.as_deref(), Some("v1"));
}

#[test]
fn test_parse_withSongPartDiv_shouldIndexSongParts() {
    let document = ttml::parse(common::sample_ttml()).unwrap();

    assert_eq!(document.metadata.song_parts, vec!["Verse".to_string()]);
    assert_eq!(document.lines[0].song_part, Some(0));
    assert_eq!(document.lines[1].song_part, Some(0));
}

#[test]
fn test_parse_withTranslationTable_shouldJoinByLineKey() {
    let document = ttml::parse(common::sample_ttml()).unwrap();

    let translation = document.lines[0].translation.as_ref().unwrap();
    assert_eq!(translation.text, "Bonjour le monde");
    assert_eq!(translation.lang.as_deref(), Some("fr"));

    // L2 has no side-table entry.
    assert!(document.lines[1].translation.is_none());
}

#[test]
fn test_parse_withTimedTransliteration_shouldCarrySyllables() {
    let content = r#"<tt xmlns="http://www.w3.org/ns/ttml" xmlns:itunes="http://music.apple.com/lyric-ttml-internal" itunes:timing="Word">
  <head>
    <metadata>
      <iTunesMetadata xmlns="http://music.apple.com/lyric-ttml-internal">
        <transliterations>
          <transliteration xml:lang="ja-Latn">
            <text for="L1"><span begin="1.0s" end="1.4s">ko</span><span begin="1.4s" end="2.0s">re</span></text>
          </transliteration>
        </transliterations>
      </iTunesMetadata>
    </metadata>
  </head>
  <body>
    <div>
      <p begin="1.0s" end="2.0s" itunes:key="L1"><span begin="1.0s" end="2.0s">これ</span></p>
    </div>
  </body>
</tt>"#;

    let document = ttml::parse(content).unwrap();

    let transliteration = document.lines[0].transliteration.as_ref().unwrap();
    assert_eq!(transliteration.text, "kore");
    assert_eq!(transliteration.lang.as_deref(), Some("ja-Latn"));

    let syllables = transliteration.syllables.as_ref().unwrap();
    assert_eq!(syllables.len(), 2);
    assert_eq!(syllables[0].start_ms, 1_000);
    assert_eq!(syllables[1].duration_ms, 600);
}

#[test]
fn test_parse_withForeignItunesNamespace_shouldFallBackToLocalName() {
    // The itunes prefix is bound to a different URI than expected; the
    // timing attribute must still resolve by local name.
    let content = r#"<tt xmlns="http://www.w3.org/ns/ttml" xmlns:itunes="http://itunes.apple.com/lyric-ttml-extensions" itunes:timing="Line">
  <body>
    <div>
      <p begin="0.5s" end="2.0s">Only line</p>
    </div>
  </body>
</tt>"#;

    let document = ttml::parse(content).unwrap();

    assert_eq!(document.kind, DocumentKind::Line);
    assert_eq!(document.lines[0].text, "Only line");
    assert!(document.lines[0].syllables.is_empty());
}

#[test]
fn test_parse_withMissingTimingAttribute_shouldInferFromSpans() {
    let content = r#"<tt xmlns="http://www.w3.org/ns/ttml">
  <body>
    <div>
      <p begin="1.0s" end="2.0s"><span begin="1.0s" end="1.5s">Word</span></p>
    </div>
  </body>
</tt>"#;

    let document = ttml::parse(content).unwrap();

    assert_eq!(document.kind, DocumentKind::Word);
}

#[test]
fn test_parse_withTimingNone_shouldReturnNone() {
    let content = r#"<tt xmlns="http://www.w3.org/ns/ttml" xmlns:itunes="http://music.apple.com/lyric-ttml-internal" itunes:timing="None">
  <body><div><p>Untimed</p></div></body>
</tt>"#;

    assert!(ttml::parse(content).is_none());
}

#[test]
fn test_parse_withKeepSeparateOption_shouldEmitWhitespaceSyllables() {
    let options = TtmlParseOptions { keep_trailing_text_separate: true };
    let document = ttml::parse_with_options(common::sample_ttml(), &options).unwrap();

    let line = &document.lines[1];
    assert_eq!(line.syllables.len(), 3);
    assert_eq!(line.syllables[0].text, "Second");
    assert_eq!(line.syllables[1].text, " ");
    assert_eq!(line.syllables[1].duration_ms, 0);
}

#[test]
fn test_parse_withParagraphMissingBegin_shouldSkipJustThatLine() {
    let content = r#"<tt xmlns="http://www.w3.org/ns/ttml">
  <body>
    <div>
      <p>No timing here</p>
      <p begin="1.0s" end="2.0s">Timed line</p>
    </div>
  </body>
</tt>"#;

    let document = ttml::parse(content).unwrap();

    assert_eq!(document.lines.len(), 1);
    assert_eq!(document.lines[0].text, "Timed line");
}

#[test]
fn test_parse_withUnparsableInput_shouldReturnNone() {
    assert!(ttml::parse("<not even xml").is_none());
    assert!(ttml::parse("<root/>").is_none());
    assert!(ttml::parse("").is_none());
}

#[test]
fn test_parseClockValue_withAcceptedForms_shouldResolveToMilliseconds() {
    assert_eq!(parse_clock_value("7.1s"), 7_100);
    assert_eq!(parse_clock_value("500ms"), 500);
    assert_eq!(parse_clock_value("1:02.5"), 62_500);
    assert_eq!(parse_clock_value("01:02:03.4"), 3_723_400);
    assert_eq!(parse_clock_value("12"), 12_000);
}

#[test]
fn test_parseClockValue_withGarbage_shouldDefaultToZero() {
    assert_eq!(parse_clock_value(""), 0);
    assert_eq!(parse_clock_value("banana"), 0);
    assert_eq!(parse_clock_value("1:2:3:4"), 0);
}
