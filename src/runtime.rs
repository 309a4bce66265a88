//! Runtime for executing the conversation
//!
//! One task owns the session and reads a mailbox. Callers talk to it through
//! a cloneable [`ConversationHandle`]; observers either watch the latest
//! snapshot or subscribe to the event stream.

mod executor;
pub mod traits;


pub use executor::ConversationRuntime;
pub use traits::*;

use crate::agent::HttpAgentClient;
use crate::state_machine::{Event, Session};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Type alias for the production runtime
pub type ProductionRuntime =
    ConversationRuntime<HttpAgentClient, RelaySpeechRecognizer, InMemoryCalendar>;

/// Events pushed to UI clients
#[derive(Debug, Clone)]
pub enum ClientEvent {
    StateChange { session: Session },
    /// Microphone permission is missing; the session did not change
    PermissionRequired,
    /// A request was rejected (e.g. empty message)
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("Conversation runtime has stopped")]
    Stopped,
}

/// Handle to interact with the running conversation
#[derive(Clone)]
pub struct ConversationHandle {
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<ClientEvent>,
    snapshot_rx: watch::Receiver<Session>,
    speech: Arc<dyn SpeechRecognizer>,
    shutdown: CancellationToken,
}

impl ConversationHandle {
    /// Start capturing speech, or report that permission is missing
    pub async fn start_listening(&self) -> Result<(), RuntimeError> {
        let permission_granted = self.speech.has_permission();
        self.send(Event::ListenRequested { permission_granted })
            .await
    }

    pub async fn stop_listening(&self) -> Result<(), RuntimeError> {
        self.send(Event::StopListening).await
    }

    /// Send typed text, superseding any request in flight
    pub async fn send_text(&self, text: impl Into<String>) -> Result<(), RuntimeError> {
        self.send(Event::SendText { text: text.into() }).await
    }

    pub async fn dismiss(&self) -> Result<(), RuntimeError> {
        self.send(Event::Dismiss).await
    }

    /// Current session; never a torn mix of two states
    pub fn snapshot(&self) -> Session {
        self.snapshot_rx.borrow().clone()
    }

    #[allow(dead_code)] // For in-process observers; HTTP clients use subscribe()
    pub fn watch(&self) -> watch::Receiver<Session> {
        self.snapshot_rx.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.broadcast_tx.subscribe()
    }

    /// Stop the runtime, releasing speech, requests and timers
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    async fn send(&self, event: Event) -> Result<(), RuntimeError> {
        if self.shutdown.is_cancelled() {
            return Err(RuntimeError::Stopped);
        }
        self.event_tx
            .send(event)
            .await
            .map_err(|_| RuntimeError::Stopped)
    }
}
