// ABOUTME: Serde data models for API responses, replicated documents and exports
// ABOUTME: Tolerant parsing with optional fields, editor-compatible export shape

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Locator of the source audio; absolute URL or path relative to the API base.
    pub audio_file: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}


/// A recognizer output unit. Times are integer milliseconds.
///
/// A leading space in `text` marks the start of a new word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub start: i64,
    pub end: i64,
    pub conf: f64,
}

impl Token {
    pub fn starts_word(&self) -> bool {
        self.text.starts_with(' ')
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(default)]
    pub speaker: Option<String>,
    #[serde(default, rename = "lang")]
    pub language: Option<String>,
    #[serde(default, rename = "children")]
    pub tokens: Vec<Token>,
}

/// Transcript as held by the replica, rendered to plain data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
}


/// One entry of the exported editor timeline.
///
/// Each item gets a fresh identifier when it is created; identifiers are never reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimelineItem {
    ParagraphStart {
        uuid: Uuid,
        speaker: String,
        language: Option<String>,
    },
    ParagraphEnd {
        uuid: Uuid,
    },
    Text {
        uuid: Uuid,
        source: String,
        #[serde(rename = "sourceStart")]
        source_start: f64,
        length: f64,
        text: String,
        conf: f64,
    },
    NonText {
        uuid: Uuid,
        source: String,
        #[serde(rename = "sourceStart")]
        source_start: f64,
        length: f64,
    },
}

impl TimelineItem {
    pub fn paragraph_start(speaker: Option<&str>, language: Option<&str>) -> Self {
        TimelineItem::ParagraphStart {
            uuid: Uuid::new_v4(),
            speaker: speaker.unwrap_or("Unknown").to_string(),
            language: language.map(str::to_string),
        }
    }

    pub fn paragraph_end() -> Self {
        TimelineItem::ParagraphEnd {
            uuid: Uuid::new_v4(),
        }
    }

    pub fn text(source: &str, source_start: f64, length: f64, text: String, conf: f64) -> Self {
        TimelineItem::Text {
            uuid: Uuid::new_v4(),
            source: source.to_string(),
            source_start,
            length,
            text,
            conf,
        }
    }

    pub fn non_text(source: &str, source_start: f64, length: f64) -> Self {
        TimelineItem::NonText {
            uuid: Uuid::new_v4(),
            source: source.to_string(),
            source_start,
            length,
        }
    }

    pub fn uuid(&self) -> Uuid {
        match self {
            TimelineItem::ParagraphStart { uuid, .. }
            | TimelineItem::ParagraphEnd { uuid }
            | TimelineItem::Text { uuid, .. }
            | TimelineItem::NonText { uuid, .. } => *uuid,
        }
    }

    /// Start and length in seconds for items that occupy source time.
    pub fn span(&self) -> Option<(f64, f64)> {
        match self {
            TimelineItem::Text {
                source_start,
                length,
                ..
            }
            | TimelineItem::NonText {
                source_start,
                length,
                ..
            } => Some((*source_start, *length)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub display_video: bool,
    pub display_speaker_names: bool,
}

/// Versioned envelope written as `document.json` inside the archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub version: u32,
    pub metadata: ExportMetadata,
    pub content: Vec<TimelineItem>,
}
