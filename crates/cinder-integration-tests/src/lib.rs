//! Shared helpers for the Cinder integration tests.
//!
//! The scenario tests live in `tests/`; everything here just boots real
//! nodes on 127.0.0.1 ephemeral ports and wires them together.

use std::time::Duration;

use cinder_dht::Node;

/// Start a node on an ephemeral localhost port.
pub async fn local_node() -> Node {
    Node::start("127.0.0.1:0".parse().expect("listen addr"))
        .await
        .expect("start node")
}

/// Boot `count` nodes and chain-ping each to the previous, so the cluster
/// forms one connected line.
pub async fn chained_cluster(count: usize) -> Vec<Node> {
    let mut nodes = Vec::with_capacity(count);
    for i in 0..count {
        let node = local_node().await;
        if i > 0 {
            let prev: &Node = &nodes[i - 1];
            node.rpc_ping(prev.self_contact().host, prev.self_contact().port)
                .await
                .expect("chain ping");
        }
        nodes.push(node);
    }
    // Let the fire-and-forget routing updates on the pinged side land.
    tokio::time::sleep(Duration::from_millis(100)).await;
    nodes
}
