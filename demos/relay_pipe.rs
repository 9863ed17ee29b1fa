//! Two relay nodes joined by an in-memory pipe
//!
//! Run with: cargo run --example relay_pipe
//!
//! Node A publishes a short synthetic stream; node B pulls it through a
//! relay session running over `tokio::io::duplex` and prints each chunk
//! as it lands on its local subscription. The same wiring works over any
//! `AsyncRead + AsyncWrite` connection a transport hands the node.
//!
//! # Architecture
//!
//! ```text
//!   node A                                 node B
//!   publish("demo")                        subscribe_via(id, peer)
//!     │ inbound                              ▲ outbound
//!     ▼                                      │
//!   dispatcher ──> session A ══ duplex ══> session B ──> dispatcher
//! ```

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use livemesh::chunk::{CodecParams, VideoChunk};
use livemesh::{Node, NodeConfig, NodeId, PeerDirectory};

struct NoPeers;

impl PeerDirectory for NoPeers {
    fn peer_ids(&self) -> Vec<String> {
        Vec::new()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let node_a = Node::new(NodeId::new([0xaa; 32]), NodeConfig::default());
    let node_b = Node::new(NodeId::new([0xbb; 32]), NodeConfig::default());
    node_a.start(Arc::new(NoPeers));
    node_b.start(Arc::new(NoPeers));

    // An in-memory connection standing in for a real transport link.
    let (conn_a, conn_b) = tokio::io::duplex(64 * 1024);
    node_a.attach_peer(conn_a);
    let handle_to_a = node_b.attach_peer(conn_b);

    let published = node_a.publish("demo").await?;
    let id = published.id().clone();
    println!("publishing {}", id);

    let subscription = node_b.subscribe_via(&id, &handle_to_a).await?;

    // Give the request a moment to reach the publisher.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let headers = vec![CodecParams::video("h264", Bytes::from_static(&[0x67]))];
    for seq in 0..5u64 {
        let payload = Bytes::from(format!("frame-{}", seq));
        published
            .inbound
            .offer(VideoChunk::data(seq, headers.clone(), payload))
            .await;
    }
    published
        .inbound
        .offer(VideoChunk::end_of_stream(5, headers))
        .await;

    while let Some(chunk) = subscription.outbound.pop().await {
        if chunk.is_eof() {
            println!("stream ended at seq {}", chunk.seq);
            break;
        }
        println!(
            "received seq {} ({} bytes)",
            chunk.seq,
            chunk.payload.len()
        );
    }

    node_a.stop();
    node_b.stop();
    Ok(())
}
