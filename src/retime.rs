/*!
 * Line-boundary retiming for parsed lyric documents.
 *
 * Source-provided end times are frequently equal to the next line's start
 * (instant, jarring transitions) or leave dead visual gaps. This pass
 * rewrites presentation end times in three ordered steps:
 * - a triple-overlap precursor resolving lines that semantically contain
 *   their successor
 * - a backward sweep snapping real overlaps through to the next resolved
 *   end and extending genuine gaps by a capped amount
 * - an epsilon-guarded write-back that leaves `natural_end_ms` untouched
 *
 * Every step derives from the preserved natural ends, which makes the pass
 * pure and idempotent: re-running it on its own output changes nothing.
 */

use log::debug;
use serde::{Deserialize, Serialize};

use crate::model::{Line, TimedDocument};

/// Minimum overlap before an end is snapped to the next line's end
const MIN_OVERLAP_MS: u64 = 100;

/// Cap on how far an end may be extended into a trailing gap
const MAX_GAP_EXTENSION_MS: u64 = 1_300;

/// Write-back threshold; smaller differences keep the stored end
const END_WRITE_EPSILON_MS: u64 = 1;

/// Characters that mark a line as a gap filler rather than lyric text
const GAP_FILLER_CHARS: &[char] = &['♪', '♫', '…', '·', '●', '-'];

/// Configuration for the retiming pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetimeConfig {
    /// Minimum overlap in ms before snapping through to the next end
    pub min_overlap_ms: u64,
    /// Maximum gap extension in ms
    pub max_gap_extension_ms: u64,
    /// Negligible end difference in ms, not written back
    pub epsilon_ms: u64,
}

impl Default for RetimeConfig {
    fn default() -> Self {
        Self {
            min_overlap_ms: MIN_OVERLAP_MS,
            max_gap_extension_ms: MAX_GAP_EXTENSION_MS,
            epsilon_ms: END_WRITE_EPSILON_MS,
        }
    }
}

/// Retiming pass over a chronologically sorted line sequence
pub struct Retimer {
    config: RetimeConfig,
}

impl Retimer {
    /// Create a new retimer with default configuration
    pub fn new() -> Self {
        Self { config: RetimeConfig::default() }
    }

    /// Create a new retimer with custom configuration
    pub fn with_config(config: RetimeConfig) -> Self {
        Self { config }
    }

    /// Retime a whole document in place
    pub fn retime_document(&self, document: &mut TimedDocument) -> usize {
        self.retime(&mut document.lines)
    }

    /// Retime a line sequence in place, returning how many ends changed
    pub fn retime(&self, lines: &mut [Line]) -> usize {
        let count = lines.len();
        if count == 0 {
            return 0;
        }

        let starts: Vec<u64> = lines.iter().map(|l| l.start_ms).collect();
        let naturals: Vec<u64> =
            lines.iter().map(|l| l.natural_end_ms.max(l.start_ms)).collect();

        let mut ends: Vec<u64> = naturals.clone();
        let mut resolved = vec![false; count];

        // Step 1: triple-overlap precursor. When A overlaps B and B
        // overlaps C but A does not overlap C, A semantically contains B;
        // A's end moves to C's start and step 2 skips it.
        for a in 0..count.saturating_sub(2) {
            let (b, c) = (a + 1, a + 2);
            let a_overlaps_b = naturals[a] > starts[b];
            let b_overlaps_c = naturals[b] > starts[c];
            let a_overlaps_c = naturals[a] > starts[c];
            if a_overlaps_b && b_overlaps_c && !a_overlaps_c {
                ends[a] = starts[c];
                resolved[a] = true;
            }
        }

        // Step 2: backward sweep over unresolved lines, last to first. The
        // next line's end is already resolved when this line reads it.
        for index in (0..count - 1).rev() {
            if resolved[index] {
                continue;
            }
            let next = index + 1;
            let natural = naturals[index];

            if starts[next].saturating_add(self.config.min_overlap_ms) <= natural {
                // Real overlap: snap through to the next resolved end.
                ends[index] = ends[next].max(starts[index]);
            } else if starts[next] < natural {
                // Near-simultaneous boundary: leaving the original end
                // avoids flicker.
            } else {
                let gap = starts[next] - natural;
                if gap > 0 && !is_gap_filler(&lines[next]) {
                    ends[index] = natural + gap.min(self.config.max_gap_extension_ms);
                }
            }
        }

        // Step 3: write-back, skipping negligible differences. The
        // natural end stays available for syllable completion logic.
        let mut changed = 0;
        for (index, line) in lines.iter_mut().enumerate() {
            let new_end = ends[index].max(starts[index]);
            if new_end.abs_diff(line.end_ms) > self.config.epsilon_ms {
                line.end_ms = new_end;
                changed += 1;
            }
        }

        debug!("Retiming adjusted {} of {} line ends", changed, count);
        changed
    }
}

impl Default for Retimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a line only fills a gap (empty or decoration-only text)
fn is_gap_filler(line: &Line) -> bool {
    let trimmed = line.text.trim();
    trimmed.is_empty()
        || trimmed.chars().all(|c| c.is_whitespace() || GAP_FILLER_CHARS.contains(&c))
}
