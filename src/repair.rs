// ABOUTME: Repairs merged timelines into a gap-filled, non-overlapping partition
// ABOUTME: Inserts non-text gaps and clamps runs that overlap their predecessor

use crate::model::TimelineItem;
use log::warn;

/// Rewrites `items` so that text and gap items tile `[0, end)` of one source.
///
/// The cursor spans the whole call, so silences across paragraph breaks
/// still become gap items. Input must belong to a single source.
///
/// Comparisons happen in whole milliseconds, the recognizer's resolution,
/// so runs that touch end-to-start never produce a gap.
///
/// Lengths never go below zero: a run that ends before the cursor, or whose
/// end precedes its own start, is kept with length 0.
pub fn repair(items: Vec<TimelineItem>, source_id: &str) -> Vec<TimelineItem> {
    let mut repaired = Vec::with_capacity(items.len());
    let mut cursor_ms = 0_i64;

    for item in items {
        let (uuid, source, source_start, length, text, conf) = match item {
            TimelineItem::Text {
                uuid,
                source,
                source_start,
                length,
                text,
                conf,
            } => (uuid, source, source_start, length, text, conf),
            other => {
                repaired.push(other);
                continue;
            }
        };

        let raw_start_ms = to_ms(source_start);
        let end_ms = raw_start_ms + to_ms(length);
        let start_ms = if raw_start_ms > cursor_ms {
            repaired.push(TimelineItem::non_text(
                source_id,
                to_seconds(cursor_ms),
                to_seconds(raw_start_ms - cursor_ms),
            ));
            raw_start_ms
        } else {
            cursor_ms
        };

        let mut length_ms = end_ms - start_ms;
        if length_ms < 0 {
            warn!(
                "text run {:?} at {:.3}s ends before {:.3}s, flooring length to 0",
                text,
                source_start,
                to_seconds(start_ms)
            );
            length_ms = 0;
        } else if start_ms > raw_start_ms {
            warn!(
                "text run {:?} overlaps previous run, clamped start {:.3}s -> {:.3}s",
                text,
                source_start,
                to_seconds(start_ms)
            );
        }

        cursor_ms = start_ms + length_ms;
        repaired.push(TimelineItem::Text {
            uuid,
            source,
            source_start: to_seconds(start_ms),
            length: to_seconds(length_ms),
            text,
            conf,
        });
    }

    repaired
}

fn to_ms(seconds: f64) -> i64 {
    (seconds * 1000.0).round() as i64
}

fn to_seconds(ms: i64) -> f64 {
    ms as f64 / 1000.0
}
