// ABOUTME: Merges sub-word recognizer tokens into timed text runs
// ABOUTME: Assembles the versioned export envelope from a repaired timeline

use crate::model::{Document, ExportDocument, ExportMetadata, TimelineItem, Token};

/// Formatting options for the exported envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportConfig {
    pub version: u32,
    pub display_video: bool,
    pub display_speaker_names: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            version: 3,
            display_video: false,
            display_speaker_names: true,
        }
    }
}

/// Text run being built from consecutive tokens of one word.
#[derive(Debug, Clone, PartialEq)]
struct RunAccumulator {
    text: String,
    start: i64,
    end: i64,
    confidence_sum: f64,
    confidence_count: u32,
}

impl RunAccumulator {
    fn start(token: &Token) -> Self {
        RunAccumulator {
            text: token.text.clone(),
            start: token.start,
            end: token.end,
            confidence_sum: token.conf,
            confidence_count: 1,
        }
    }

    /// Recognizer end times are not monotonic, so the run end never moves backwards.
    fn extend(mut self, token: &Token) -> Self {
        self.text.push_str(&token.text);
        self.end = self.end.max(token.end);
        self.confidence_sum += token.conf;
        self.confidence_count += 1;
        self
    }

    fn into_item(self, source_id: &str) -> TimelineItem {
        TimelineItem::text(
            source_id,
            self.start as f64 / 1000.0,
            (self.end - self.start) as f64 / 1000.0,
            self.text,
            self.confidence_sum / f64::from(self.confidence_count),
        )
    }
}

/// Flattens a document into paragraph markers and merged text runs.
///
/// Gaps are not represented here; `repair::repair` inserts them.
pub fn merge(document: &Document, source_id: &str) -> Vec<TimelineItem> {
    let mut content = Vec::new();

    for paragraph in &document.paragraphs {
        content.push(TimelineItem::paragraph_start(
            paragraph.speaker.as_deref(),
            paragraph.language.as_deref(),
        ));

        let mut run: Option<RunAccumulator> = None;
        for token in &paragraph.tokens {
            run = Some(match run.take() {
                Some(current) if !token.starts_word() => current.extend(token),
                Some(current) => {
                    content.push(current.into_item(source_id));
                    RunAccumulator::start(token)
                }
                None => RunAccumulator::start(token),
            });
        }

        if let Some(current) = run {
            content.push(current.into_item(source_id));
        }
        content.push(TimelineItem::paragraph_end());
    }

    content
}

pub fn to_export_document(content: Vec<TimelineItem>, config: &ExportConfig) -> ExportDocument {
    ExportDocument {
        version: config.version,
        metadata: ExportMetadata {
            display_video: config.display_video,
            display_speaker_names: config.display_speaker_names,
        },
        content,
    }
}
