//! Server-Sent Events (SSE) broadcaster
//!
//! Fan-out of domain events to connected clients. Consumers use the stream
//! to invalidate cached access-gate state the moment a signature lands.

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};

use crate::events::SplitmarkEvent;

/// Broadcast-backed SSE fan-out shared across HTTP handlers
#[derive(Clone)]
pub struct SseBroadcaster {
    tx: broadcast::Sender<SplitmarkEvent>,
}

impl SseBroadcaster {
    /// Create a new broadcaster buffering up to `capacity` events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Broadcast an event, ignoring if no clients are connected
    pub fn broadcast_lossy(&self, event: SplitmarkEvent) {
        match self.tx.send(event) {
            Ok(count) => debug!("Broadcast event to {} clients", count),
            Err(_) => debug!("No SSE clients connected, event dropped"),
        }
    }

    /// Get current number of connected clients
    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Create an SSE stream for a new client connection
    pub fn subscribe_stream(&self) -> impl Stream<Item = Result<Event, Infallible>> {
        let rx = self.tx.subscribe();
        let stream = BroadcastStream::new(rx);

        stream.filter_map(|result| async move {
            match result {
                Ok(domain_event) => Event::default()
                    .event(domain_event.event_name())
                    .json_data(&domain_event)
                    .ok()
                    .map(Ok),
                Err(e) => {
                    // Lagged receiver; log and continue
                    warn!("SSE client error: {:?}", e);
                    None
                }
            }
        })
    }

    /// Axum handler body for GET /events
    pub fn handle_sse_connection(&self) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
        info!(
            "New SSE client connected, total clients: {}",
            self.client_count()
        );

        Sse::new(self.subscribe_stream()).keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(30))
                .text("keep-alive"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_broadcast_reaches_subscriber() {
        let broadcaster = SseBroadcaster::new(8);
        let mut rx = broadcaster.tx.subscribe();

        broadcaster.broadcast_lossy(SplitmarkEvent::SplitsheetVoided {
            splitsheet_id: Uuid::nil(),
            song_reference: "SR-100".to_string(),
            timestamp: chrono::Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_name(), "SplitsheetVoided");
    }

    #[test]
    fn test_broadcast_without_subscribers_is_lossy() {
        let broadcaster = SseBroadcaster::new(8);
        // no receivers; must not panic or error
        broadcaster.broadcast_lossy(SplitmarkEvent::SplitsheetVoided {
            splitsheet_id: Uuid::nil(),
            song_reference: "SR-100".to_string(),
            timestamp: chrono::Utc::now(),
        });
        assert_eq!(broadcaster.client_count(), 0);
    }
}
