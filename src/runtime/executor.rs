//! Conversation runtime executor

use super::traits::{AgentClient, CalendarSource, SpeechEvent, SpeechRecognizer, UserContext};
use super::{ClientEvent, ConversationHandle};

use crate::agent::{decode_body, normalize};
use crate::scheduler::TimeoutScheduler;
use crate::state_machine::{transition, ConvContext, Effect, Event, Session};
use chrono::{Days, Local, NaiveDate};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

const MAILBOX_CAPACITY: usize = 64;
const BROADCAST_CAPACITY: usize = 128;
const DEFAULT_CALENDAR_WINDOW_DAYS: u64 = 7;

/// Generic conversation runtime that can work with any agent, speech and calendar implementations
pub struct ConversationRuntime<A, S, C>
where
    A: AgentClient + 'static,
    S: SpeechRecognizer + 'static,
    C: CalendarSource + 'static,
{
    context: ConvContext,
    session: Session,
    agent: Arc<A>,
    speech: Arc<S>,
    calendar: Arc<C>,
    /// Days of calendar sent with each request, counting from today
    calendar_window_days: u64,
    event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<ClientEvent>,
    snapshot_tx: watch::Sender<Session>,
    scheduler: TimeoutScheduler,
    /// Token to stop forwarding the current speech subscription
    speech_cancel_token: Option<CancellationToken>,
    /// Token to abort the in-flight agent request
    request_cancel_token: Option<CancellationToken>,
    shutdown: CancellationToken,
}

impl<A, S, C> ConversationRuntime<A, S, C>
where
    A: AgentClient + 'static,
    S: SpeechRecognizer + 'static,
    C: CalendarSource + 'static,
{
    pub fn new(
        context: ConvContext,
        agent: A,
        speech: Arc<S>,
        calendar: C,
    ) -> (Self, ConversationHandle) {
        let (event_tx, event_rx) = mpsc::channel(MAILBOX_CAPACITY);
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(Session::default());
        let shutdown = CancellationToken::new();

        let handle = ConversationHandle {
            event_tx: event_tx.clone(),
            broadcast_tx: broadcast_tx.clone(),
            snapshot_rx,
            speech: speech.clone(),
            shutdown: shutdown.clone(),
        };

        let runtime = Self {
            context,
            session: Session::default(),
            agent: Arc::new(agent),
            speech,
            calendar: Arc::new(calendar),
            calendar_window_days: DEFAULT_CALENDAR_WINDOW_DAYS,
            event_rx,
            scheduler: TimeoutScheduler::new(event_tx.clone()),
            event_tx,
            broadcast_tx,
            snapshot_tx,
            speech_cancel_token: None,
            request_cancel_token: None,
            shutdown,
        };

        (runtime, handle)
    }

    /// Set how many days of calendar to send with each request
    pub fn with_calendar_window(mut self, days: u64) -> Self {
        self.calendar_window_days = days;
        self
    }

    pub async fn run(mut self) {
        tracing::info!(
            follow_up = ?self.context.follow_up,
            result_timeout = ?self.context.result_timeout,
            asking_timeout = ?self.context.asking_timeout,
            "Starting conversation runtime"
        );

        // Process events in a loop - no recursion
        loop {
            tokio::select! {
                biased;

                () = self.shutdown.cancelled() => break,

                Some(event) = self.event_rx.recv() => self.process_event(event),

                else => break,
            }
        }

        self.teardown();
        tracing::info!("Conversation runtime stopped");
    }

    fn process_event(&mut self, event: Event) {
        let event_name = event.name();

        // Pure state transition
        let result = match transition(&self.session, &self.context, event) {
            Ok(r) => r,
            Err(e) => {
                // Transition errors are user-facing (e.g., "empty message")
                tracing::warn!(event = event_name, state = self.session.state.as_str(), error = %e, "Event rejected");
                let _ = self.broadcast_tx.send(ClientEvent::Error {
                    message: e.to_string(),
                });
                return;
            }
        };

        let old_session = std::mem::replace(&mut self.session, result.new_session);
        if old_session.generation == self.session.generation {
            tracing::debug!(
                event = event_name,
                state = self.session.state.as_str(),
                "Event left session unchanged"
            );
        } else {
            tracing::info!(
                event = event_name,
                from = old_session.state.as_str(),
                to = self.session.state.as_str(),
                generation = self.session.generation,
                "State transition"
            );
        }

        for effect in result.effects {
            self.execute_effect(effect);
        }
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::StartSpeech { generation } => {
                if let Some(token) = self.speech_cancel_token.take() {
                    token.cancel();
                }
                let cancel_token = CancellationToken::new();
                self.speech_cancel_token = Some(cancel_token.clone());

                let stream = self.speech.listen();
                let event_tx = self.event_tx.clone();
                tokio::spawn(forward_speech(stream, generation, event_tx, cancel_token));
            }

            Effect::FinishSpeech => {
                self.speech.finish();
            }

            Effect::ReleaseSpeech => {
                if let Some(token) = self.speech_cancel_token.take() {
                    token.cancel();
                }
                self.speech.cancel();
            }

            Effect::SendToAgent { text, generation } => {
                if let Some(token) = self.request_cancel_token.take() {
                    token.cancel();
                }
                let cancel_token = CancellationToken::new();
                self.request_cancel_token = Some(cancel_token.clone());

                // Spawn agent request as background task
                let agent = self.agent.clone();
                let calendar = self.calendar.clone();
                let window_days = self.calendar_window_days;
                let event_tx = self.event_tx.clone();

                tokio::spawn(async move {
                    tracing::info!(generation, chars = text.len(), "Sending to agent (background)");

                    // Race the request against cancellation
                    tokio::select! {
                        biased;

                        () = cancel_token.cancelled() => {
                            tracing::info!(generation, "Agent request aborted");
                        }

                        event = request_reply(agent.as_ref(), calendar.as_ref(), window_days, text, generation) => {
                            let _ = event_tx.send(event).await;
                        }
                    }
                });
            }

            Effect::AbortRequest => {
                if let Some(token) = self.request_cancel_token.take() {
                    token.cancel();
                }
            }

            Effect::ScheduleTimeout { delay, generation } => {
                tracing::debug!(generation, ?delay, "Arming timeout");
                self.scheduler.arm(delay, generation);
            }

            Effect::CancelTimeouts => {
                self.scheduler.cancel_all();
            }

            Effect::PublishState => {
                self.snapshot_tx.send_replace(self.session.clone());
                let _ = self.broadcast_tx.send(ClientEvent::StateChange {
                    session: self.session.clone(),
                });
            }

            Effect::NotifyPermissionRequired => {
                tracing::info!("Microphone permission required");
                let _ = self.broadcast_tx.send(ClientEvent::PermissionRequired);
            }
        }
    }

    /// Release everything still running when the runtime stops
    fn teardown(&mut self) {
        if let Some(token) = self.speech_cancel_token.take() {
            token.cancel();
            self.speech.cancel();
        }
        if let Some(token) = self.request_cancel_token.take() {
            token.cancel();
        }
        self.scheduler.cancel_all();
    }
}

/// Stamp recognizer output with its generation and post it to the mailbox
async fn forward_speech(
    mut stream: futures::stream::BoxStream<'static, SpeechEvent>,
    generation: u64,
    event_tx: mpsc::Sender<Event>,
    cancel_token: CancellationToken,
) {
    loop {
        let next = tokio::select! {
            biased;
            () = cancel_token.cancelled() => return,
            next = stream.next() => next,
        };

        let event = match next {
            Some(SpeechEvent::Listening) => Event::SpeechReady { generation },
            Some(SpeechEvent::FinalText { text }) => Event::SpeechFinal { generation, text },
            Some(SpeechEvent::Error { message }) => Event::SpeechFailed {
                generation,
                message,
            },
            // A stream that ends without a result counts as cancelled
            Some(SpeechEvent::Cancelled) | None => Event::SpeechCancelled { generation },
        };

        let terminal = !matches!(event, Event::SpeechReady { .. });
        if event_tx.send(event).await.is_err() || terminal {
            return;
        }
    }
}

/// Gather context, send, decode and normalize. Every outcome becomes an event.
async fn request_reply<A, C>(
    agent: &A,
    calendar: &C,
    window_days: u64,
    text: String,
    generation: u64,
) -> Event
where
    A: AgentClient + ?Sized,
    C: CalendarSource + ?Sized,
{
    let context = gather_context(calendar, Local::now().date_naive(), window_days).await;

    let body = match agent.send_message(&text, &context).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(generation, error = %e, kind = ?e.kind, "Agent request failed");
            return Event::ResponseFailed {
                generation,
                error: e.into(),
            };
        }
    };

    match decode_body(&body) {
        Ok(payload) => Event::ResponseReceived {
            generation,
            content: normalize(payload),
        },
        Err(e) => {
            tracing::warn!(generation, error = %e, "Could not decode agent reply");
            Event::ResponseFailed {
                generation,
                error: e.into(),
            }
        }
    }
}

/// Calendar is best effort: a failing source sends no events rather than blocking the request
async fn gather_context<C>(calendar: &C, today: NaiveDate, window_days: u64) -> UserContext
where
    C: CalendarSource + ?Sized,
{
    let end = today
        .checked_add_days(Days::new(window_days))
        .unwrap_or(today);

    let events = match calendar.events_between(today, end).await {
        Ok(events) => events,
        Err(e) => {
            tracing::warn!(error = %e, "Calendar unavailable, sending without events");
            Vec::new()
        }
    };

    UserContext { today, events }
}
