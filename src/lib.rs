// ABOUTME: Public library API for the transcript archive exporter
// ABOUTME: Re-exports core modules for external use

pub mod api;
pub mod archive;
pub mod auth;
pub mod cli;
pub mod convert;
pub mod error;
pub mod export;
pub mod model;
pub mod repair;
pub mod replication;
pub mod storage;
pub mod stream;
pub mod util;

pub use error::{Error, Result};
pub use model::{
    Document, DocumentMetadata, DocumentSummary, ExportDocument, Paragraph, TimelineItem, Token,
};
