//! Server-Sent Events support

use crate::runtime::ClientEvent;
use crate::state_machine::Session;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert broadcast stream to SSE stream, starting with the current session
pub fn sse_stream(
    init: Session,
    broadcast_rx: tokio::sync::broadcast::Receiver<ClientEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let init = futures::stream::once(async move {
        let data = json!({ "type": "init", "session": init });
        Ok(Event::default().event("init").data(data.to_string()))
    });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(client_event_to_axum(event))),
        Err(_) => None, // Skip lagged messages
    });

    Sse::new(init.chain(broadcasts)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn client_event_to_axum(event: ClientEvent) -> Event {
    let (event_type, data) = client_event_json(event);
    Event::default().event(event_type).data(data.to_string())
}

fn client_event_json(event: ClientEvent) -> (&'static str, serde_json::Value) {
    match event {
        ClientEvent::StateChange { session } => (
            "state_change",
            json!({
                "type": "state_change",
                "session": session
            }),
        ),
        ClientEvent::PermissionRequired => (
            "permission_required",
            json!({
                "type": "permission_required"
            }),
        ),
        ClientEvent::Error { message } => (
            "error",
            json!({
                "type": "error",
                "message": message
            }),
        ),
    }
}
