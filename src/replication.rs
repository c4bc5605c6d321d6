// ABOUTME: Pull-based replication state machine over framed sync messages
// ABOUTME: Applies CRDT changes or snapshots until the backlog is drained

use crate::model::Document;
use crate::{Error, Result};
use automerge::{AutoCommit, AutoSerde, Change};
use log::{debug, info};

pub const TAG_CHANGE: u8 = 1;
pub const TAG_BACKLOG_COMPLETE: u8 = 2;
pub const TAG_FULL_DOCUMENT: u8 = 3;

/// A decoded sync message: one tag byte followed by an opaque payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<'a> {
    Change(&'a [u8]),
    BacklogComplete,
    FullDocument(&'a [u8]),
}

impl<'a> Frame<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        let (tag, payload) = bytes
            .split_first()
            .ok_or_else(|| Error::Replication("empty frame".into()))?;

        match *tag {
            TAG_CHANGE => Ok(Frame::Change(payload)),
            TAG_BACKLOG_COMPLETE => Ok(Frame::BacklogComplete),
            TAG_FULL_DOCUMENT => Ok(Frame::FullDocument(payload)),
            other => Err(Error::Replication(format!("unknown frame tag {}", other))),
        }
    }
}

/// Ordered supplier of raw frames. `Ok(None)` means the stream closed.
pub trait FrameSource {
    fn recv_frame(&mut self) -> Result<Option<Vec<u8>>>;
}

#[derive(Debug)]
pub enum ReplicationEvent {
    /// An incremental change was applied to the replica.
    Changed,
    /// The replica was replaced by a full snapshot.
    Snapshot,
    /// The server drained its backlog; carries the final document.
    Done(Document),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingMessage,
    Complete,
}

/// Rebuilds one document from one message stream.
///
/// Dropping the replicator abandons the partial replica.
pub struct Replicator<S> {
    source: S,
    replica: AutoCommit,
    state: State,
    changes_applied: usize,
}

impl<S: FrameSource> Replicator<S> {
    pub fn new(source: S) -> Self {
        Replicator {
            source,
            replica: AutoCommit::new(),
            state: State::AwaitingMessage,
            changes_applied: 0,
        }
    }

    pub fn changes_applied(&self) -> usize {
        self.changes_applied
    }

    /// Blocks for the next frame and applies it.
    pub fn next_event(&mut self) -> Result<ReplicationEvent> {
        if self.state == State::Complete {
            return Err(Error::Replication("replication already complete".into()));
        }

        let bytes = self.source.recv_frame()?.ok_or_else(|| {
            Error::Replication("stream closed before backlog was complete".into())
        })?;

        match Frame::parse(&bytes)? {
            Frame::Change(payload) => {
                let change = Change::from_bytes(payload.to_vec())
                    .map_err(|e| Error::Replication(format!("malformed change: {}", e)))?;
                self.replica
                    .apply_changes(std::iter::once(change))
                    .map_err(|e| Error::Replication(format!("failed to apply change: {}", e)))?;
                self.changes_applied += 1;
                debug!("applied change #{}", self.changes_applied);
                Ok(ReplicationEvent::Changed)
            }
            Frame::FullDocument(payload) => {
                self.replica = AutoCommit::load(payload)
                    .map_err(|e| Error::Replication(format!("malformed snapshot: {}", e)))?;
                debug!("loaded snapshot of {} bytes", payload.len());
                Ok(ReplicationEvent::Snapshot)
            }
            Frame::BacklogComplete => {
                self.state = State::Complete;
                info!(
                    "backlog complete after {} incremental changes",
                    self.changes_applied
                );
                Ok(ReplicationEvent::Done(self.document()?))
            }
        }
    }

    /// Renders the current replica as a transcript document.
    pub fn document(&self) -> Result<Document> {
        let value = serde_json::to_value(AutoSerde::from(&self.replica))?;
        Ok(serde_json::from_value(value)?)
    }
}

/// Drives a replicator to completion.
pub fn replicate<S: FrameSource>(source: S) -> Result<Document> {
    let mut replicator = Replicator::new(source);
    loop {
        if let ReplicationEvent::Done(document) = replicator.next_event()? {
            return Ok(document);
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use automerge::transaction::Transactable;
    use automerge::{ObjId, ObjType, ReadDoc, ScalarValue, ROOT};
    use std::collections::VecDeque;

    pub struct QueueSource(pub VecDeque<Vec<u8>>);

    impl FrameSource for QueueSource {
        fn recv_frame(&mut self) -> Result<Option<Vec<u8>>> {
            Ok(self.0.pop_front())
        }
    }

    pub fn frame(tag: u8, payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![tag];
        bytes.extend_from_slice(payload);
        bytes
    }

    /// Builds a transcript replica on the "server" side.
    pub struct ServerDoc {
        pub doc: AutoCommit,
        paragraphs: ObjId,
    }

    impl ServerDoc {
        pub fn new() -> Self {
            let mut doc = AutoCommit::new();
            let paragraphs = doc
                .put_object(ROOT, "paragraphs", ObjType::List)
                .unwrap();
            ServerDoc { doc, paragraphs }
        }

        pub fn push_paragraph(&mut self, speaker: Option<&str>, tokens: &[(&str, i64, i64, f64)]) {
            let index = self.doc.length(&self.paragraphs);
            let para = self
                .doc
                .insert_object(&self.paragraphs, index, ObjType::Map)
                .unwrap();
            match speaker {
                Some(name) => self.doc.put(&para, "speaker", name).unwrap(),
                None => self.doc.put(&para, "speaker", ScalarValue::Null).unwrap(),
            }
            self.doc.put(&para, "lang", "en").unwrap();
            let children = self
                .doc
                .put_object(&para, "children", ObjType::List)
                .unwrap();
            for (i, (text, start, end, conf)) in tokens.iter().enumerate() {
                let token = self.doc.insert_object(&children, i, ObjType::Map).unwrap();
                self.doc.put(&token, "text", *text).unwrap();
                self.doc.put(&token, "start", *start).unwrap();
                self.doc.put(&token, "end", *end).unwrap();
                self.doc.put(&token, "conf", *conf).unwrap();
            }
        }

        /// Commits pending operations and returns them as one encoded change.
        pub fn commit_change(&mut self) -> Vec<u8> {
            self.doc.commit();
            self.doc
                .get_last_local_change()
                .map(|change| change.raw_bytes().to_vec())
                .unwrap()
        }

        pub fn snapshot(&mut self) -> Vec<u8> {
            self.doc.save()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use std::collections::VecDeque;

    fn source(frames: Vec<Vec<u8>>) -> QueueSource {
        QueueSource(VecDeque::from(frames))
    }

    #[test]
    fn test_frame_parse() {
        assert_eq!(Frame::parse(&[1, 7, 8]).unwrap(), Frame::Change(&[7, 8]));
        assert_eq!(Frame::parse(&[2]).unwrap(), Frame::BacklogComplete);
        assert_eq!(Frame::parse(&[3, 9]).unwrap(), Frame::FullDocument(&[9]));
    }

    #[test]
    fn test_frame_parse_rejects_unknown_and_empty() {
        assert!(matches!(Frame::parse(&[4, 0]), Err(Error::Replication(_))));
        assert!(matches!(Frame::parse(&[]), Err(Error::Replication(_))));
    }

    #[test]
    fn test_replicate_incremental_changes() {
        let mut server = ServerDoc::new();
        let first = server.commit_change();
        server.push_paragraph(Some("Ada"), &[(" Hi", 0, 200, 0.9)]);
        let second = server.commit_change();
        server.push_paragraph(None, &[(" Bye", 300, 500, 0.5)]);
        let third = server.commit_change();

        let doc = replicate(source(vec![
            frame(TAG_CHANGE, &first),
            frame(TAG_CHANGE, &second),
            frame(TAG_CHANGE, &third),
            frame(TAG_BACKLOG_COMPLETE, &[]),
        ]))
        .unwrap();

        assert_eq!(doc.paragraphs.len(), 2);
        assert_eq!(doc.paragraphs[0].speaker.as_deref(), Some("Ada"));
        assert_eq!(doc.paragraphs[0].tokens[0].text, " Hi");
        assert_eq!(doc.paragraphs[0].tokens[0].end, 200);
        assert!(doc.paragraphs[1].speaker.is_none());
        assert_eq!(doc.paragraphs[1].tokens[0].conf, 0.5);
    }

    #[test]
    fn test_snapshot_replaces_applied_changes() {
        let mut stale = ServerDoc::new();
        stale.push_paragraph(Some("Stale"), &[(" old", 0, 100, 1.0)]);
        let stale_change = stale.commit_change();

        let mut server = ServerDoc::new();
        server.push_paragraph(Some("Ada"), &[(" new", 0, 100, 1.0)]);
        let snapshot = server.snapshot();

        let mut replicator = Replicator::new(source(vec![
            frame(TAG_CHANGE, &stale_change),
            frame(TAG_FULL_DOCUMENT, &snapshot),
            frame(TAG_BACKLOG_COMPLETE, &[]),
        ]));

        assert!(matches!(
            replicator.next_event().unwrap(),
            ReplicationEvent::Changed
        ));
        assert!(matches!(
            replicator.next_event().unwrap(),
            ReplicationEvent::Snapshot
        ));
        let doc = match replicator.next_event().unwrap() {
            ReplicationEvent::Done(doc) => doc,
            other => panic!("expected completion, got {:?}", other),
        };

        assert_eq!(doc.paragraphs.len(), 1);
        assert_eq!(doc.paragraphs[0].speaker.as_deref(), Some("Ada"));
        assert_eq!(replicator.changes_applied(), 1);
    }

    #[test]
    fn test_backlog_complete_on_fresh_replica_is_empty() {
        let doc = replicate(source(vec![frame(TAG_BACKLOG_COMPLETE, &[])])).unwrap();
        assert!(doc.paragraphs.is_empty());
    }

    #[test]
    fn test_stream_closed_before_backlog_complete() {
        let mut server = ServerDoc::new();
        let change = server.commit_change();
        let result = replicate(source(vec![frame(TAG_CHANGE, &change)]));
        assert!(matches!(result, Err(Error::Replication(_))));
    }

    #[test]
    fn test_malformed_change_is_fatal() {
        let result = replicate(source(vec![
            frame(TAG_CHANGE, b"not a change"),
            frame(TAG_BACKLOG_COMPLETE, &[]),
        ]));
        assert!(matches!(result, Err(Error::Replication(_))));
    }

    #[test]
    fn test_malformed_snapshot_is_fatal() {
        let result = replicate(source(vec![
            frame(TAG_FULL_DOCUMENT, b"garbage"),
            frame(TAG_BACKLOG_COMPLETE, &[]),
        ]));
        assert!(matches!(result, Err(Error::Replication(_))));
    }

    #[test]
    fn test_next_event_after_completion_errors() {
        let mut replicator = Replicator::new(source(vec![
            frame(TAG_BACKLOG_COMPLETE, &[]),
            frame(TAG_BACKLOG_COMPLETE, &[]),
        ]));
        assert!(matches!(
            replicator.next_event().unwrap(),
            ReplicationEvent::Done(_)
        ));
        assert!(replicator.next_event().is_err());
    }
}
