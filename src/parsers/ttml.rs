use std::collections::HashMap;
use log::{debug, warn};
use roxmltree::{Document as XmlDocument, Node};

use crate::model::{
    Agent, AgentKind, DocumentKind, DocumentMetadata, Line, LyricSource, SideText, Syllable,
    TimedDocument,
};

// @module: TTML (timed-text markup) parsing

// @const: Core timed-text namespace
const TTML_NS: &str = "http://www.w3.org/ns/ttml";

// @const: Timed-text metadata namespace (agents, roles)
const TTM_NS: &str = "http://www.w3.org/ns/ttml#metadata";

// @const: Music-service extension namespace (timing mode, keys, song parts)
const ITUNES_NS: &str = "http://music.apple.com/lyric-ttml-internal";

// @const: The xml: namespace (lang, id)
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Document-level timing attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimingAttr {
    Word,
    Line,
    None,
}

/// Options controlling span-walk details.
#[derive(Debug, Clone, Default)]
pub struct TtmlParseOptions {
    /// Keep text trailing a span as its own untimed syllable instead of
    /// appending it to the span it follows.
    pub keep_trailing_text_separate: bool,
}

/// Parse a TTML document with default options.
pub fn parse(content: &str) -> Option<TimedDocument> {
    parse_with_options(content, &TtmlParseOptions::default())
}

/// Parse a TTML document into a timed document.
///
/// Returns `None` for unparsable markup or markup with no usable timed
/// paragraphs; both are normal "lyrics not found" outcomes. Individual
/// malformed spans or paragraphs are skipped, never fatal.
pub fn parse_with_options(content: &str, options: &TtmlParseOptions) -> Option<TimedDocument> {
    let xml = match XmlDocument::parse(content) {
        Ok(doc) => doc,
        Err(e) => {
            debug!("TTML input did not parse as XML: {}", e);
            return None;
        }
    };

    let root = xml.root_element();
    if root.tag_name().name() != "tt" {
        debug!("TTML root element is <{}>, expected <tt>", root.tag_name().name());
        return None;
    }
    if root.tag_name().namespace().is_some_and(|ns| ns != TTML_NS) {
        // Not a validator: odd namespaces are tolerated, matching by
        // local names throughout.
        debug!("Root <tt> carries a non-standard namespace");
    }

    let timing = resolve_timing(root);
    if timing == TimingAttr::None {
        debug!("TTML document declares timing=None, nothing to synchronize");
        return None;
    }
    let word_mode = timing == TimingAttr::Word;

    let mut metadata = DocumentMetadata {
        source: LyricSource::Ttml,
        language: xml_lang(root).map(str::to_string),
        ..DocumentMetadata::default()
    };

    let mut translations: HashMap<String, SideText> = HashMap::new();
    let mut transliterations: HashMap<String, SideText> = HashMap::new();
    collect_metadata(root, &mut metadata, &mut translations, &mut transliterations, options);

    let body = root.children().find(|n| n.is_element() && n.tag_name().name() == "body")?;

    let mut lines: Vec<Line> = Vec::new();
    for node in body.children().filter(Node::is_element) {
        match node.tag_name().name() {
            "div" => {
                let song_part = itunes_attr(node, "song-part").map(|name| {
                    metadata.song_parts.push(name.to_string());
                    metadata.song_parts.len() - 1
                });
                for p in node.children().filter(|n| n.is_element() && n.tag_name().name() == "p") {
                    if let Some(mut line) =
                        parse_paragraph(p, word_mode, options, &translations, &transliterations)
                    {
                        line.song_part = song_part;
                        lines.push(line);
                    }
                }
            }
            // Some documents skip the div wrapper entirely.
            "p" => {
                if let Some(line) =
                    parse_paragraph(node, word_mode, options, &translations, &transliterations)
                {
                    lines.push(line);
                }
            }
            other => debug!("Skipping unexpected <{}> in body", other),
        }
    }

    if lines.is_empty() {
        debug!("TTML document produced no timed lines");
        return None;
    }

    lines.sort_by_key(|line| line.start_ms);

    Some(TimedDocument {
        kind: if word_mode { DocumentKind::Word } else { DocumentKind::Line },
        metadata,
        lines,
    })
}

/// Parse a TTML clock value to non-negative integer milliseconds.
///
/// Accepts `H:MM:SS.fff`, `MM:SS.fff`, bare seconds (optionally suffixed
/// `s`), and `ms`-suffixed values. Anything unparsable resolves to 0
/// rather than failing.
pub fn parse_clock_value(raw: &str) -> u64 {
    let value = raw.trim();
    if value.is_empty() {
        return 0;
    }

    if let Some(ms) = value.strip_suffix("ms") {
        return ms.trim().parse::<f64>().map_or(0, to_ms_unscaled);
    }
    if let Some(secs) = value.strip_suffix('s') {
        return secs.trim().parse::<f64>().map_or(0, |s| to_ms_unscaled(s * 1000.0));
    }

    let parts: Vec<&str> = value.split(':').collect();
    let seconds = match parts.as_slice() {
        [ss] => ss.parse::<f64>().unwrap_or(0.0),
        [mm, ss] => {
            mm.parse::<f64>().unwrap_or(0.0) * 60.0 + ss.parse::<f64>().unwrap_or(0.0)
        }
        [hh, mm, ss] => {
            hh.parse::<f64>().unwrap_or(0.0) * 3600.0
                + mm.parse::<f64>().unwrap_or(0.0) * 60.0
                + ss.parse::<f64>().unwrap_or(0.0)
        }
        _ => {
            debug!("Unrecognized clock value: {}", raw);
            0.0
        }
    };

    to_ms_unscaled(seconds * 1000.0)
}

fn to_ms_unscaled(ms: f64) -> u64 {
    if ms.is_finite() { ms.max(0.0).round() as u64 } else { 0 }
}

/// Namespaced attribute lookup with a local-name fallback.
///
/// Documents in the wild declare these namespaces inconsistently (or bind
/// the expected prefix to a different URI), so a missing namespaced
/// attribute is retried by bare local name.
fn scoped_attr<'a>(node: Node<'a, '_>, ns: &str, local: &str) -> Option<&'a str> {
    node.attribute((ns, local)).or_else(|| {
        node.attributes().find(|a| a.name() == local).map(|a| a.value())
    })
}

fn itunes_attr<'a>(node: Node<'a, '_>, local: &str) -> Option<&'a str> {
    scoped_attr(node, ITUNES_NS, local)
}

fn ttm_attr<'a>(node: Node<'a, '_>, local: &str) -> Option<&'a str> {
    scoped_attr(node, TTM_NS, local)
}

fn xml_lang<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    scoped_attr(node, XML_NS, "lang")
}

fn xml_id<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    scoped_attr(node, XML_NS, "id")
}

/// Resolve the document timing mode, inferring from span timing when the
/// attribute is absent.
fn resolve_timing(root: Node) -> TimingAttr {
    match itunes_attr(root, "timing").map(str::to_lowercase).as_deref() {
        Some("word") => TimingAttr::Word,
        Some("line") => TimingAttr::Line,
        Some("none") => TimingAttr::None,
        Some(other) => {
            warn!("Unknown timing attribute '{}', inferring from spans", other);
            infer_timing(root)
        }
        None => infer_timing(root),
    }
}

fn infer_timing(root: Node) -> TimingAttr {
    let word = root.descendants().any(|n| {
        n.is_element() && n.tag_name().name() == "span" && n.attribute("begin").is_some()
    });
    if word { TimingAttr::Word } else { TimingAttr::Line }
}

/// Collect agents, songwriters, and the translation/transliteration side
/// tables from the document head.
fn collect_metadata(
    root: Node,
    metadata: &mut DocumentMetadata,
    translations: &mut HashMap<String, SideText>,
    transliterations: &mut HashMap<String, SideText>,
    options: &TtmlParseOptions,
) {
    let Some(head) = root.children().find(|n| n.is_element() && n.tag_name().name() == "head")
    else {
        return;
    };

    for node in head.descendants().filter(Node::is_element) {
        match node.tag_name().name() {
            "agent" => {
                let Some(id) = xml_id(node) else { continue };
                let kind = node
                    .attribute("type")
                    .map(AgentKind::from_type_attr)
                    .unwrap_or_default();
                let name = node
                    .children()
                    .find(|n| n.is_element() && n.tag_name().name() == "name")
                    .and_then(|n| n.text())
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty());
                metadata.agents.insert(id.to_string(), Agent { kind, name });
            }
            "songwriter" => {
                if let Some(text) = node.text() {
                    let text = text.trim();
                    if !text.is_empty() {
                        metadata.song_writers.push(text.to_string());
                    }
                }
            }
            "translation" => {
                collect_side_table(node, translations, &|lang, entry| {
                    SideText::plain(lang, gather_text(entry))
                });
            }
            "transliteration" => {
                collect_side_table(node, transliterations, &|lang, entry| {
                    // A transliteration entry may carry its own span timing.
                    let syllables = walk_spans(entry, 0, options);
                    if syllables.is_empty() {
                        SideText::plain(lang, gather_text(entry))
                    } else {
                        let text = syllables.iter().map(|s| s.text.as_str()).collect();
                        SideText { lang, text, syllables: Some(syllables) }
                    }
                });
            }
            "title" => {
                if metadata.title.is_none() {
                    metadata.title =
                        node.text().map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
                }
            }
            _ => {}
        }
    }
}

/// Walk `<text for="key">` entries under a translation/transliteration
/// element, building one side-text per line key. The first entry for a
/// key wins.
fn collect_side_table(
    node: Node,
    table: &mut HashMap<String, SideText>,
    build: &dyn Fn(Option<String>, Node) -> SideText,
) {
    let lang = xml_lang(node).map(str::to_string);
    for entry in node.children().filter(|n| n.is_element() && n.tag_name().name() == "text") {
        let Some(key) = entry.attribute("for") else { continue };
        if table.contains_key(key) {
            continue;
        }
        table.insert(key.to_string(), build(lang.clone(), entry));
    }
}

/// Concatenate every text node under an element.
fn gather_text(node: Node) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Parse one `<p>` paragraph into a line.
fn parse_paragraph(
    p: Node,
    word_mode: bool,
    options: &TtmlParseOptions,
    translations: &HashMap<String, SideText>,
    transliterations: &HashMap<String, SideText>,
) -> Option<Line> {
    let Some(begin_attr) = p.attribute("begin") else {
        debug!("Skipping <p> without begin attribute");
        return None;
    };
    let start_ms = parse_clock_value(begin_attr);
    let end_ms = p
        .attribute("end")
        .map(parse_clock_value)
        .unwrap_or(start_ms)
        .max(start_ms);

    let syllables = if word_mode { walk_spans(p, start_ms, options) } else { Vec::new() };

    let text = if syllables.is_empty() {
        gather_text(p)
    } else {
        // Foreground text carries the line; background runs stay on their
        // own syllables.
        let fg: String =
            syllables.iter().filter(|s| !s.is_background).map(|s| s.text.as_str()).collect();
        if fg.trim().is_empty() {
            syllables.iter().map(|s| s.text.as_str()).collect()
        } else {
            fg
        }
    };

    if text.trim().is_empty() {
        debug!("Skipping empty <p> at {}", start_ms);
        return None;
    }

    let mut line = Line::new(start_ms, end_ms, text.trim().to_string());
    line.speaker = ttm_attr(p, "agent").map(str::to_string);
    line.syllables = finalize_syllables(syllables, end_ms);

    if let Some(key) = itunes_attr(p, "key") {
        line.translation = translations.get(key).cloned();
        line.transliteration = transliterations.get(key).cloned();
    }

    Some(line)
}

/// Walk the timed child spans of a container into syllables.
///
/// A span found inside a background role wrapper is flagged background,
/// and spans nested inside it are excluded from this flat walk so they are
/// not counted twice (one level of wrapping is flattened; deeper nesting
/// is not re-walked). Text immediately following a span is appended to
/// that span unless `keep_trailing_text_separate` is set.
fn walk_spans(container: Node, container_start_ms: u64, options: &TtmlParseOptions) -> Vec<Syllable> {
    let mut syllables: Vec<Syllable> = Vec::new();
    walk_span_level(container, container_start_ms, false, options, &mut syllables);
    syllables
}

fn walk_span_level(
    container: Node,
    container_start_ms: u64,
    background: bool,
    options: &TtmlParseOptions,
    out: &mut Vec<Syllable>,
) {
    for child in container.children() {
        if child.is_element() && child.tag_name().name() == "span" {
            let is_bg_wrapper = ttm_attr(child, "role") == Some("x-bg");
            if is_bg_wrapper && !background {
                // Flatten exactly one level of background wrapping.
                walk_span_level(child, container_start_ms, true, options, out);
                continue;
            }

            let Some(begin_attr) = child.attribute("begin") else {
                debug!("Skipping span without begin attribute");
                continue;
            };
            let start_ms = parse_clock_value(begin_attr);
            let duration_ms = child
                .attribute("end")
                .map(parse_clock_value)
                .map(|end| end.saturating_sub(start_ms))
                .unwrap_or(0);
            let Some(text) = child.text() else { continue };

            let mut syllable = Syllable::new(text.to_string(), start_ms, duration_ms);
            syllable.is_background = background;
            out.push(syllable);
        } else if child.is_text() {
            let Some(text) = child.text() else { continue };
            if text.is_empty() {
                continue;
            }
            match out.last_mut() {
                Some(prev) if !options.keep_trailing_text_separate => {
                    prev.text.push_str(text);
                }
                Some(prev) => {
                    let start_ms = prev.end_ms();
                    let mut syllable = Syllable::new(text.to_string(), start_ms, 0);
                    syllable.is_background = background;
                    out.push(syllable);
                }
                None => {
                    if !text.trim().is_empty() {
                        let mut syllable =
                            Syllable::new(text.to_string(), container_start_ms, 0);
                        syllable.is_background = background;
                        out.push(syllable);
                    }
                }
            }
        }
    }
}

/// Resolve trailing durations and line-ending flags once the paragraph end
/// is known.
fn finalize_syllables(mut syllables: Vec<Syllable>, line_end_ms: u64) -> Vec<Syllable> {
    let count = syllables.len();
    for (index, syllable) in syllables.iter_mut().enumerate() {
        if syllable.duration_ms == 0 && index + 1 == count {
            syllable.duration_ms = line_end_ms.saturating_sub(syllable.start_ms);
        }
        syllable.is_line_ending = index + 1 == count;
    }
    syllables
}
