//! Background thread for store I/O.
//!
//! The UI thread never touches the filesystem: it sends a [`StoreRequest`]
//! and drains [`StoreResponse`]s on each frame. Requests are handled one at
//! a time in submission order.

use doc_model::{Document, DocumentId, DocumentMetadata};
use doc_store::{DocumentStore, NewDocument};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

pub enum StoreRequest {
    List,
    Save { source: PathBuf, metadata: DocumentMetadata },
    Delete(Document),
    Clear,
    Shutdown,
}

pub enum StoreResponse {
    Listed(Result<Vec<Document>, String>),
    Saved(Result<Document, String>),
    Deleted(Result<DocumentId, String>),
    Cleared(Result<usize, String>),
}

pub struct StoreWorker {
    requests: Sender<StoreRequest>,
    responses: Receiver<StoreResponse>,
    thread: Option<JoinHandle<()>>,
}

impl StoreWorker {
    pub fn spawn(store: DocumentStore) -> std::io::Result<Self> {
        let (request_tx, request_rx) = mpsc::channel();
        let (response_tx, response_rx) = mpsc::channel();

        let thread = thread::Builder::new()
            .name("docshelf-store-worker".to_owned())
            .spawn(move || Self::run(store, request_rx, response_tx))?;

        Ok(Self { requests: request_tx, responses: response_rx, thread: Some(thread) })
    }

    pub fn send(&self, request: StoreRequest) {
        let _ = self.requests.send(request);
    }

    /// Non-blocking; returns `None` once the queue is drained.
    pub fn try_recv(&self) -> Option<StoreResponse> {
        match self.responses.try_recv() {
            Ok(response) => Some(response),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    #[cfg(test)]
    fn recv_timeout(&self, timeout: std::time::Duration) -> Option<StoreResponse> {
        self.responses.recv_timeout(timeout).ok()
    }

    fn run(
        store: DocumentStore,
        requests: Receiver<StoreRequest>,
        responses: Sender<StoreResponse>,
    ) {
        for request in requests {
            let response = match request {
                StoreRequest::List => {
                    StoreResponse::Listed(store.list().map_err(|err| err.to_string()))
                }
                StoreRequest::Save { source, metadata } => {
                    StoreResponse::Saved(save(&store, &source, metadata))
                }
                StoreRequest::Delete(document) => {
                    let id = document.id;
                    StoreResponse::Deleted(
                        store.delete(&document).map(|()| id).map_err(|err| err.to_string()),
                    )
                }
                StoreRequest::Clear => {
                    StoreResponse::Cleared(store.delete_all().map_err(|err| err.to_string()))
                }
                StoreRequest::Shutdown => break,
            };

            if responses.send(response).is_err() {
                break;
            }
        }
    }
}

impl Drop for StoreWorker {
    fn drop(&mut self) {
        let _ = self.requests.send(StoreRequest::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("store worker thread panicked");
            }
        }
    }
}

fn save(
    store: &DocumentStore,
    source: &Path,
    metadata: DocumentMetadata,
) -> Result<Document, String> {
    let id = store.next_id().map_err(|err| err.to_string())?;
    let new = NewDocument {
        id,
        date: chrono::Local::now().format("%Y-%m-%d").to_string(),
        metadata,
    };

    store.save(&new, source).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn worker() -> (StoreWorker, tempfile::TempDir) {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let store = DocumentStore::with_root(temp.path().join("documents"));
        let worker = StoreWorker::spawn(store).expect("worker should spawn");
        (worker, temp)
    }

    fn metadata(title: &str) -> DocumentMetadata {
        DocumentMetadata {
            title: title.to_owned(),
            author: "Hari".to_owned(),
            description: "Signed copy".to_owned(),
        }
    }

    #[test]
    fn save_then_list_round_trips() {
        let (worker, temp) = worker();
        let source = temp.path().join("scan.png");
        fs::write(&source, b"png bytes").unwrap();

        worker.send(StoreRequest::Save { source, metadata: metadata("Lease") });
        let saved = match worker.recv_timeout(TIMEOUT) {
            Some(StoreResponse::Saved(Ok(document))) => document,
            other => panic!("expected Saved(Ok(_)), got {:?}", discriminant_name(other)),
        };
        assert_eq!(saved.metadata.title, "Lease");

        worker.send(StoreRequest::List);
        match worker.recv_timeout(TIMEOUT) {
            Some(StoreResponse::Listed(Ok(documents))) => {
                assert_eq!(documents.len(), 1);
                assert_eq!(documents[0].id, saved.id);
            }
            other => panic!("expected Listed(Ok(_)), got {:?}", discriminant_name(other)),
        }
    }

    #[test]
    fn save_failure_is_reported_not_fatal() {
        let (worker, temp) = worker();
        let source = temp.path().join("notes.txt");
        fs::write(&source, b"plain text").unwrap();

        worker.send(StoreRequest::Save { source, metadata: metadata("Notes") });
        match worker.recv_timeout(TIMEOUT) {
            Some(StoreResponse::Saved(Err(message))) => {
                assert!(message.contains("unsupported content type"));
            }
            other => panic!("expected Saved(Err(_)), got {:?}", discriminant_name(other)),
        }

        // The worker is still alive after the failure.
        worker.send(StoreRequest::List);
        assert!(matches!(worker.recv_timeout(TIMEOUT), Some(StoreResponse::Listed(Ok(_)))));
    }

    #[test]
    fn delete_and_clear_report_outcomes() {
        let (worker, temp) = worker();
        let source = temp.path().join("scan.png");
        fs::write(&source, b"png").unwrap();

        worker.send(StoreRequest::Save { source, metadata: metadata("Lease") });
        let saved = match worker.recv_timeout(TIMEOUT) {
            Some(StoreResponse::Saved(Ok(document))) => document,
            other => panic!("expected Saved(Ok(_)), got {:?}", discriminant_name(other)),
        };

        worker.send(StoreRequest::Delete(saved.clone()));
        match worker.recv_timeout(TIMEOUT) {
            Some(StoreResponse::Deleted(Ok(id))) => assert_eq!(id, saved.id),
            other => panic!("expected Deleted(Ok(_)), got {:?}", discriminant_name(other)),
        }

        worker.send(StoreRequest::Clear);
        match worker.recv_timeout(TIMEOUT) {
            Some(StoreResponse::Cleared(Ok(removed))) => assert_eq!(removed, 0),
            other => panic!("expected Cleared(Ok(_)), got {:?}", discriminant_name(other)),
        }
    }

    #[test]
    fn drop_shuts_the_worker_down() {
        let (worker, _temp) = worker();
        drop(worker);
        // Shutdown is successful if this completes without hanging.
    }

    fn discriminant_name(response: Option<StoreResponse>) -> &'static str {
        match response {
            None => "None",
            Some(StoreResponse::Listed(_)) => "Listed",
            Some(StoreResponse::Saved(_)) => "Saved",
            Some(StoreResponse::Deleted(_)) => "Deleted",
            Some(StoreResponse::Cleared(_)) => "Cleared",
        }
    }
}
