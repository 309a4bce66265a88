//! Trait abstractions for runtime I/O
//!
//! The conversation only talks to the outside world through these traits,
//! which keeps the executor testable with mock implementations.

use crate::agent::AgentError;
use async_trait::async_trait;
use chrono::NaiveDate;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

// ============================================================================
// Shared types
// ============================================================================

/// A calendar record the agent may refer to by id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// What the client sends alongside the user's words
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserContext {
    pub today: NaiveDate,
    /// Events in the window starting today
    pub events: Vec<CalendarEvent>,
}

/// Output of the speech recognizer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpeechEvent {
    /// Engine is ready and capturing
    Listening,
    FinalText { text: String },
    Cancelled,
    Error { message: String },
}

#[derive(Debug, Error)]
#[error("Calendar unavailable: {0}")]
pub struct CalendarError(pub String);

// ============================================================================
// Collaborators
// ============================================================================

/// Client for the agent backend
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Send the user's text and return the raw response body
    async fn send_message(&self, text: &str, context: &UserContext) -> Result<String, AgentError>;
}

/// Speech-to-text engine
pub trait SpeechRecognizer: Send + Sync {
    /// Whether the microphone may be used
    fn has_permission(&self) -> bool;

    /// Start recognizing; the stream ends after a final, cancelled or error event
    fn listen(&self) -> BoxStream<'static, SpeechEvent>;

    /// Finish the current utterance, producing a final event
    fn finish(&self);

    /// Abandon recognition
    fn cancel(&self);
}

/// Read access to the local calendar
#[async_trait]
pub trait CalendarSource: Send + Sync {
    async fn events_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CalendarEvent>, CalendarError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: AgentClient + ?Sized> AgentClient for Arc<T> {
    async fn send_message(&self, text: &str, context: &UserContext) -> Result<String, AgentError> {
        (**self).send_message(text, context).await
    }
}

impl<T: SpeechRecognizer + ?Sized> SpeechRecognizer for Arc<T> {
    fn has_permission(&self) -> bool {
        (**self).has_permission()
    }

    fn listen(&self) -> BoxStream<'static, SpeechEvent> {
        (**self).listen()
    }

    fn finish(&self) {
        (**self).finish();
    }

    fn cancel(&self) {
        (**self).cancel();
    }
}

#[async_trait]
impl<T: CalendarSource + ?Sized> CalendarSource for Arc<T> {
    async fn events_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CalendarEvent>, CalendarError> {
        (**self).events_between(start, end).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Speech recognizer running on the UI client
///
/// The client does the recognition and posts its events over HTTP; this
/// adapter relays them into whichever subscription is active.
pub struct RelaySpeechRecognizer {
    permission: AtomicBool,
    active: Mutex<Option<mpsc::UnboundedSender<SpeechEvent>>>,
}

impl RelaySpeechRecognizer {
    pub fn new(permission_granted: bool) -> Self {
        Self {
            permission: AtomicBool::new(permission_granted),
            active: Mutex::new(None),
        }
    }

    pub fn set_permission(&self, granted: bool) {
        self.permission.store(granted, Ordering::SeqCst);
    }

    /// Forward a client event. Returns false when nobody is listening.
    pub fn relay(&self, event: SpeechEvent) -> bool {
        let active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        match active.as_ref() {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }
}

impl SpeechRecognizer for RelaySpeechRecognizer {
    fn has_permission(&self) -> bool {
        self.permission.load(Ordering::SeqCst)
    }

    fn listen(&self) -> BoxStream<'static, SpeechEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        // Replacing the sender ends any previous subscription
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);
        UnboundedReceiverStream::new(rx).boxed()
    }

    fn finish(&self) {
        // The client finalizes on its own when the user stops talking
        tracing::debug!("Speech finish requested");
    }

    fn cancel(&self) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

/// Calendar held in memory, optionally loaded from a JSON file
#[derive(Debug, Default)]
pub struct InMemoryCalendar {
    events: Vec<CalendarEvent>,
}

impl InMemoryCalendar {
    pub fn new(events: Vec<CalendarEvent>) -> Self {
        Self { events }
    }

    /// Load a JSON array of events
    pub fn load(path: &Path) -> Result<Self, CalendarError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| CalendarError(format!("{}: {e}", path.display())))?;
        let events = serde_json::from_str(&raw)
            .map_err(|e| CalendarError(format!("{}: {e}", path.display())))?;
        Ok(Self { events })
    }
}

#[async_trait]
impl CalendarSource for InMemoryCalendar {
    async fn events_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CalendarEvent>, CalendarError> {
        Ok(self
            .events
            .iter()
            .filter(|event| event.date >= start && event.date <= end)
            .cloned()
            .collect())
    }
}
