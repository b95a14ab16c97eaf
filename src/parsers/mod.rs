/*!
 * Lyric format parsers.
 *
 * Each parser turns raw text into the canonical [`TimedDocument`] model:
 * - `lrc`: line-timed LRC and Enhanced LRC with inline word tags
 * - `ttml`: namespaced timed-text markup, word- or line-timed
 *
 * Parsers never fail with an error: input that cannot be understood yields
 * `None`, the normal "lyrics not found" outcome.
 */

pub mod lrc;
pub mod ttml;

use log::debug;

use crate::model::TimedDocument;

/// Parse lyric content, sniffing the format from the payload.
///
/// Markup payloads (a leading `<` and a `<tt` root somewhere near the top)
/// are routed to the TTML parser; everything else is tried as LRC.
pub fn parse_auto(content: &str) -> Option<TimedDocument> {
    if looks_like_ttml(content) {
        debug!("Auto-detected TTML payload");
        return ttml::parse(content);
    }
    debug!("Trying payload as LRC");
    lrc::parse(content)
}

/// Cheap format sniff; false negatives fall through to the LRC parser,
/// which rejects markup by finding no timestamp tags.
fn looks_like_ttml(content: &str) -> bool {
    let head = content.trim_start();
    head.starts_with('<') && head.get(..512).unwrap_or(head).contains("<tt")
}
