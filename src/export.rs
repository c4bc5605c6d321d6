// ABOUTME: End-to-end export of one document into an editor archive
// ABOUTME: Replicates, normalizes the timeline, fetches audio, then packages

use crate::{
    api::ApiClient,
    archive::write_archive,
    convert::{merge, to_export_document, ExportConfig},
    repair::repair,
    replication::{FrameSource, ReplicationEvent, Replicator},
    storage::Paths,
    util::archive_file_name,
    Document, ExportDocument, Result,
};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::path::PathBuf;
use std::time::Duration;

pub struct ExportRequest {
    pub doc_id: String,
    pub output: Option<PathBuf>,
    pub config: ExportConfig,
}

/// Runs replication to completion while reporting progress.
pub fn replicate_with_progress<S: FrameSource>(source: S) -> Result<Document> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message("Waiting for sync backlog...");

    let mut replicator = Replicator::new(source);
    let document = loop {
        match replicator.next_event() {
            Ok(ReplicationEvent::Changed) => {
                spinner.set_message(format!("{} changes applied", replicator.changes_applied()));
            }
            Ok(ReplicationEvent::Snapshot) => spinner.set_message("Loaded full snapshot"),
            Ok(ReplicationEvent::Done(document)) => break document,
            Err(e) => {
                spinner.abandon_with_message("Replication failed");
                return Err(e);
            }
        }
    };

    spinner.finish_with_message(format!(
        "Replicated {} paragraphs",
        document.paragraphs.len()
    ));
    Ok(document)
}

/// Turns a replicated document into the editor's export envelope.
pub fn build_export(document: &Document, source_id: &str, config: &ExportConfig) -> ExportDocument {
    let merged = merge(document, source_id);
    let content = repair(merged, source_id);
    to_export_document(content, config)
}

/// Exports one document; nothing is written unless every step succeeds.
pub fn export_document<S: FrameSource>(
    client: &ApiClient,
    source: S,
    paths: &Paths,
    request: &ExportRequest,
) -> Result<PathBuf> {
    let document = replicate_with_progress(source)?;

    println!("Fetching metadata for {}...", request.doc_id);
    let meta = client.get_metadata(&request.doc_id)?;

    println!("Downloading audio...");
    let audio = client.fetch_audio(&meta.audio_file)?;
    info!("fetched {} bytes of audio", audio.len());

    let export = build_export(&document, &request.doc_id, &request.config);

    let target = match &request.output {
        Some(path) => path.clone(),
        None => {
            paths.ensure_dirs()?;
            paths.archive_path(&archive_file_name(meta.name.as_deref(), &request.doc_id))
        }
    };

    write_archive(&target, &request.doc_id, &audio, &export)?;

    println!(
        "Exported {} timeline items to {}",
        export.content.len(),
        target.display()
    );
    Ok(target)
}
