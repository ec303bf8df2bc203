//! Caller-side handle for an in-flight request.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::error::HttpError;
use crate::event::{Event, Outcome};

/// Receives the events of one request and can cancel it.
///
/// Dropping the handle cancels the request unless an [`AbortHandle`] is
/// still alive.
#[derive(Debug)]
pub struct RequestHandle {
    events: mpsc::UnboundedReceiver<Event>,
    abort: Arc<watch::Sender<bool>>,
}

impl RequestHandle {
    pub(crate) fn new(events: mpsc::UnboundedReceiver<Event>, abort: Arc<watch::Sender<bool>>) -> Self {
        Self { events, abort }
    }

    /// Next event, or `None` once `complete` has been delivered.
    pub async fn next_event(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    /// Cancel the request. It completes with [`HttpError::Aborted`] unless
    /// it already finished.
    pub fn abort(&self) {
        self.abort.send_replace(true);
    }

    /// Handle that can abort the request from elsewhere.
    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            abort: Arc::clone(&self.abort),
        }
    }

    /// Collect every remaining event.
    pub async fn events(mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Some(event) = self.events.recv().await {
            let done = event.is_complete();
            events.push(event);
            if done {
                break;
            }
        }
        events
    }

    /// Wait for the terminal outcome, skipping intermediate events.
    pub async fn complete(mut self) -> Outcome {
        while let Some(event) = self.events.recv().await {
            if let Event::Complete(outcome) = event {
                return outcome;
            }
        }
        Err(Arc::new(HttpError::Aborted))
    }
}

/// Cloneable abort signal for a request.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    abort: Arc<watch::Sender<bool>>,
}

impl AbortHandle {
    pub fn abort(&self) {
        self.abort.send_replace(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> (mpsc::UnboundedSender<Event>, watch::Receiver<bool>, RequestHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (abort_tx, abort_rx) = watch::channel(false);
        (tx, abort_rx, RequestHandle::new(rx, Arc::new(abort_tx)))
    }

    #[tokio::test]
    async fn test_complete_skips_to_outcome() {
        let (tx, _abort, handle) = handle();
        tx.send(Event::Error(Arc::new(HttpError::Aborted))).unwrap();
        tx.send(Event::Complete(Err(Arc::new(HttpError::Aborted)))).unwrap();
        assert!(matches!(handle.complete().await, Err(e) if matches!(*e, HttpError::Aborted)));
    }

    #[tokio::test]
    async fn test_closed_channel_completes_as_aborted() {
        let (tx, _abort, handle) = handle();
        drop(tx);
        assert!(handle.complete().await.is_err());
    }

    #[tokio::test]
    async fn test_abort_signals_receiver() {
        let (_tx, mut abort, handle) = handle();
        handle.abort_handle().abort();
        abort.changed().await.unwrap();
        assert!(*abort.borrow());
    }

    #[tokio::test]
    async fn test_dropping_handle_closes_signal() {
        let (_tx, mut abort, handle) = handle();
        drop(handle);
        assert!(abort.changed().await.is_err());
    }
}
