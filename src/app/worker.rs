use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::gateway::{GatewayError, NoteGateway};
use crate::notes::editor::NoteEdit;
use crate::notes::store::HydrateTicket;
use crate::notes::{Note, NoteDraft, NoteId};
use crate::sources::{ContentSourceError, ContentSources, SourceKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftOrigin {
    Typed,
    Sourced(SourceKind),
}

#[derive(Debug, Clone)]
pub enum Request {
    Hydrate(HydrateTicket),
    Create { draft: NoteDraft, origin: DraftOrigin },
    Delete(NoteId),
    DeleteAll,
    Update(NoteEdit),
    Fetch(SourceKind),
}

#[derive(Debug)]
pub enum Reply {
    Hydrated {
        ticket: HydrateTicket,
        result: Result<Vec<Note>, GatewayError>,
    },
    Created {
        origin: DraftOrigin,
        result: Result<Note, GatewayError>,
    },
    Deleted {
        id: NoteId,
        result: Result<(), GatewayError>,
    },
    DeletedAll(Result<(), GatewayError>),
    Updated {
        id: NoteId,
        result: Result<Note, GatewayError>,
    },
    Fetched {
        kind: SourceKind,
        result: Result<NoteDraft, ContentSourceError>,
    },
}

/// Background thread that owns every blocking backend and web call.
/// Requests are served one at a time in submission order.
pub struct Worker {
    requests: Option<Sender<Request>>,
    replies: Receiver<Reply>,
    handle: Option<JoinHandle<()>>,
    in_flight: usize,
}

impl Worker {
    pub fn spawn(gateway: Arc<dyn NoteGateway>, sources: ContentSources) -> Result<Self> {
        let (request_tx, request_rx) = unbounded();
        let (reply_tx, reply_rx) = unbounded();
        let handle = thread::Builder::new()
            .name("notetake-worker".into())
            .spawn(move || serve(gateway.as_ref(), &sources, request_rx, reply_tx))
            .context("spawning request worker")?;
        Ok(Self {
            requests: Some(request_tx),
            replies: reply_rx,
            handle: Some(handle),
            in_flight: 0,
        })
    }

    pub fn submit(&mut self, request: Request) -> bool {
        let Some(requests) = &self.requests else {
            return false;
        };
        tracing::debug!(?request, "submitting request");
        match requests.send(request) {
            Ok(()) => {
                self.in_flight += 1;
                true
            }
            Err(err) => {
                tracing::error!(request = ?err.into_inner(), "request worker is gone");
                false
            }
        }
    }

    pub fn try_recv(&mut self) -> Option<Reply> {
        match self.replies.try_recv() {
            Ok(reply) => Some(self.settle(reply)),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<Reply> {
        match self.replies.recv_timeout(timeout) {
            Ok(reply) => Some(self.settle(reply)),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    fn settle(&mut self, reply: Reply) -> Reply {
        self.in_flight = self.in_flight.saturating_sub(1);
        reply
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("request worker panicked");
            }
        }
    }
}

fn serve(
    gateway: &dyn NoteGateway,
    sources: &ContentSources,
    requests: Receiver<Request>,
    replies: Sender<Reply>,
) {
    for request in requests.iter() {
        let reply = handle(gateway, sources, request);
        if replies.send(reply).is_err() {
            break;
        }
    }
    tracing::debug!("request worker stopped");
}

fn handle(gateway: &dyn NoteGateway, sources: &ContentSources, request: Request) -> Reply {
    match request {
        Request::Hydrate(ticket) => Reply::Hydrated {
            ticket,
            result: gateway.list(),
        },
        Request::Create { draft, origin } => Reply::Created {
            origin,
            result: gateway.create(&draft),
        },
        Request::Delete(id) => Reply::Deleted {
            id,
            result: gateway.delete_one(id),
        },
        Request::DeleteAll => Reply::DeletedAll(gateway.delete_all()),
        Request::Update(edit) => Reply::Updated {
            id: edit.note_id,
            result: gateway.update(edit.note_id, &edit.draft()),
        },
        Request::Fetch(kind) => Reply::Fetched {
            kind,
            result: sources.fetch(kind),
        },
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::gateway::EmbeddedGateway;
    use crate::sources::ContentSource;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    const WAIT: Duration = Duration::from_secs(5);

    pub(crate) struct StubSource {
        pub kind: SourceKind,
        pub draft: Option<NoteDraft>,
    }

    impl ContentSource for StubSource {
        fn kind(&self) -> SourceKind {
            self.kind
        }

        fn fetch(&self) -> Result<NoteDraft, ContentSourceError> {
            self.draft.clone().ok_or(ContentSourceError::Status {
                kind: self.kind,
                status: 500,
            })
        }
    }

    pub(crate) fn stub_sources() -> ContentSources {
        ContentSources::new(
            Arc::new(StubSource {
                kind: SourceKind::Joke,
                draft: Some(NoteDraft::from_joke("I only know dad jokes")),
            }),
            Arc::new(StubSource {
                kind: SourceKind::Quote,
                draft: None,
            }),
        )
    }

    fn spawn_embedded() -> anyhow::Result<(TempDir, Worker)> {
        let temp = TempDir::new()?;
        let gateway = EmbeddedGateway::open(&temp.path().join("notes.db"), 1000)?;
        let worker = Worker::spawn(Arc::new(gateway), stub_sources())?;
        Ok((temp, worker))
    }

    #[test]
    fn requests_are_answered_in_order() -> anyhow::Result<()> {
        let (_temp, mut worker) = spawn_embedded()?;
        assert!(worker.submit(Request::Create {
            draft: NoteDraft::new("t", "c"),
            origin: DraftOrigin::Typed,
        }));
        assert!(worker.submit(Request::Hydrate(HydrateTicket(1))));
        assert_eq!(worker.in_flight(), 2);

        let created = worker.recv_timeout(WAIT).expect("created");
        let note = assert_matches!(
            created,
            Reply::Created { origin: DraftOrigin::Typed, result: Ok(note) } => note
        );
        let hydrated = worker.recv_timeout(WAIT).expect("hydrated");
        assert_matches!(
            hydrated,
            Reply::Hydrated { ticket: HydrateTicket(1), result: Ok(notes) } if notes == vec![note.clone()]
        );
        assert_eq!(worker.in_flight(), 0);
        Ok(())
    }

    #[test]
    fn gateway_errors_come_back_as_replies() -> anyhow::Result<()> {
        let (_temp, mut worker) = spawn_embedded()?;
        worker.submit(Request::Delete(NoteId(404)));
        assert_matches!(
            worker.recv_timeout(WAIT),
            Some(Reply::Deleted { id: NoteId(404), result: Err(GatewayError::MissingNote(_)) })
        );
        Ok(())
    }

    #[test]
    fn fetch_goes_through_content_sources() -> anyhow::Result<()> {
        let (_temp, mut worker) = spawn_embedded()?;
        worker.submit(Request::Fetch(SourceKind::Joke));
        worker.submit(Request::Fetch(SourceKind::Quote));

        assert_matches!(
            worker.recv_timeout(WAIT),
            Some(Reply::Fetched { kind: SourceKind::Joke, result: Ok(draft) }) if draft.title == "I only know..."
        );
        assert_matches!(
            worker.recv_timeout(WAIT),
            Some(Reply::Fetched { kind: SourceKind::Quote, result: Err(_) })
        );
        Ok(())
    }

    #[test]
    fn try_recv_is_empty_when_idle() -> anyhow::Result<()> {
        let (_temp, mut worker) = spawn_embedded()?;
        assert!(worker.try_recv().is_none());
        Ok(())
    }
}
