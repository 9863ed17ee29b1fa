//! Fire-and-forget event reporting
//!
//! The node emits small JSON events (peer-list snapshots, broadcast and
//! consume notifications) to an external visualization endpoint over plain
//! HTTP. Delivery is best-effort by contract: failures are logged at debug
//! level and never propagate into the relay path. With no endpoint
//! configured, every call is a no-op.

use serde_json::{json, Value};

use crate::id::{NodeId, StreamId};

/// Client for the external reporting sink.
pub struct EventReporter {
    node: String,
    endpoint: Option<String>,
    client: reqwest::Client,
}

impl EventReporter {
    /// Create a reporter posting to `endpoint`, or a disabled one for
    /// `None`.
    pub fn new(node: &NodeId, endpoint: Option<String>) -> Self {
        Self {
            node: node.to_hex(),
            endpoint,
            client: reqwest::Client::new(),
        }
    }

    /// Whether events will actually be sent anywhere.
    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Report the current peer set.
    pub async fn log_peers(&self, peers: &[String]) {
        let mut event = self.base_event("peers");
        event["peers"] = json!(peers);
        self.post(event).await;
    }

    /// Report that this node started broadcasting a stream.
    pub async fn log_broadcast(&self, stream: &StreamId) {
        self.post_stream_event("broadcast", stream).await;
    }

    /// Report that this node started consuming a stream.
    pub async fn log_consume(&self, stream: &StreamId) {
        self.post_stream_event("consume", stream).await;
    }

    /// Report that this node is relaying a stream for others.
    pub async fn log_relay(&self, stream: &StreamId) {
        self.post_stream_event("relay", stream).await;
    }

    /// Report that a stream finished.
    pub async fn log_done(&self, stream: &StreamId) {
        self.post_stream_event("done", stream).await;
    }

    fn base_event(&self, name: &str) -> Value {
        json!({
            "name": name,
            "node": self.node,
        })
    }

    async fn post_stream_event(&self, name: &str, stream: &StreamId) {
        let mut event = self.base_event(name);
        event["streamId"] = json!(stream.as_str());
        self.post(event).await;
    }

    async fn post(&self, event: Value) {
        let Some(endpoint) = &self.endpoint else {
            return;
        };

        match self.client.post(endpoint).json(&event).send().await {
            Ok(resp) if !resp.status().is_success() => {
                tracing::debug!(status = %resp.status(), "reporting sink rejected event");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(error = %e, "reporting sink unreachable");
            }
        }
    }
}
