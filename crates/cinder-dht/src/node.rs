//! The node facade.
//!
//! A [`Node`] owns its RPC listener, routing coordinator and store
//! coordinator. It exposes three layers:
//!
//! 1. typed client stubs for the four wire operations (`rpc_*`), which
//!    record repliers and returned contacts in the routing table;
//! 2. the iterative composite operations (`iterative_*`);
//! 3. the outer string API (`do_*`, `local_find_value`) whose result lines
//!    begin with `"OK: "` or `"ERR: "`, the only place values are rendered
//!    as text.
//!
//! Cloning a `Node` clones channel handles, not state; clones address the
//! same running node.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use cinder_transport::messages::{
    FindNodeRequest, FindValueRequest, PingRequest, RpcRequest, RpcResponse, StoreRequest,
};
use cinder_transport::tcp::{self, RpcListener};
use cinder_types::{Contact, KadId};

use crate::kbuckets::{Pinger, RoutingHandle};
use crate::lookup::{Lookup, ValueLookup};
use crate::rpc::NodeRpc;
use crate::store::StoreHandle;
use crate::{NodeError, Result, NODE_PROBE_TIMEOUT, RPC_TIMEOUT, VALUE_PROBE_TIMEOUT};

/// Outcome of a single FIND_VALUE call against one peer.
#[derive(Clone, Debug)]
pub enum ValueReply {
    /// The peer holds the key.
    Value(Vec<u8>),
    /// The peer does not hold the key; these are its closest contacts.
    Nodes(Vec<Contact>),
}

/// A running DHT node.
#[derive(Clone)]
pub struct Node {
    self_contact: Contact,
    pub(crate) routing: RoutingHandle,
    pub(crate) store: StoreHandle,
}

/// Liveness probe for the routing table's eviction check, implemented as a
/// plain PING call so the table never depends on the node type.
struct RpcPinger {
    self_contact: Contact,
}

impl Pinger for RpcPinger {
    async fn ping(&self, host: Ipv4Addr, port: u16) -> bool {
        let request = RpcRequest::Ping(PingRequest {
            sender: self.self_contact,
            msg_id: KadId::random(),
        });
        matches!(
            tcp::call(SocketAddr::from((host, port)), &request, RPC_TIMEOUT).await,
            Ok(RpcResponse::Pong(_))
        )
    }
}

impl Node {
    /// Start a node: bind the listener, spawn the coordinators, serve RPCs.
    ///
    /// Port 0 selects an ephemeral port; an unspecified host is advertised
    /// as 127.0.0.1.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::Network`] for an IPv6 listen address and
    /// [`NodeError::Transport`] if the socket cannot be bound.
    pub async fn start(listen_addr: SocketAddr) -> Result<Node> {
        let listener = RpcListener::bind(listen_addr).await?;
        let local = listener.local_addr();
        let host = match local {
            SocketAddr::V4(v4) if v4.ip().is_unspecified() => Ipv4Addr::LOCALHOST,
            SocketAddr::V4(v4) => *v4.ip(),
            SocketAddr::V6(_) => {
                return Err(NodeError::Network(
                    "IPv6 listen addresses are not supported".to_string(),
                ))
            }
        };

        let self_contact = Contact::new(KadId::random(), host, local.port());
        let routing = RoutingHandle::spawn(self_contact.id, RpcPinger { self_contact });
        let store = StoreHandle::spawn();

        let handler = Arc::new(NodeRpc::new(self_contact, routing.clone(), store.clone()));
        tokio::spawn(async move {
            if let Err(e) = listener.serve(handler).await {
                tracing::error!(error = %e, "RPC listener exited");
            }
        });

        tracing::info!(node = %self_contact, "node started");

        Ok(Node {
            self_contact,
            routing,
            store,
        })
    }

    /// This node's own contact record.
    pub fn self_contact(&self) -> Contact {
        self.self_contact
    }

    /// This node's identifier.
    pub fn node_id(&self) -> KadId {
        self.self_contact.id
    }

    // -----------------------------------------------------------------
    // Local operations
    // -----------------------------------------------------------------

    /// Exact-match routing table lookup.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::NotFound`] if the contact is not in its bucket.
    pub async fn find_contact(&self, id: KadId) -> Result<Contact> {
        self.routing.find_one(id).await.ok_or(NodeError::NotFound)
    }

    /// Store a value in the local store.
    pub async fn local_put(&self, key: KadId, value: Vec<u8>) {
        self.store.put(key, value).await;
    }

    /// Fetch a value from the local store.
    pub async fn local_get(&self, key: KadId) -> Option<Vec<u8>> {
        self.store.get(key).await
    }

    // -----------------------------------------------------------------
    // Client stubs
    // -----------------------------------------------------------------

    /// PING a peer by address; record the responder in the routing table.
    ///
    /// # Errors
    ///
    /// Transport failures and mismatched replies propagate; both mean the
    /// peer is treated as dead.
    pub async fn rpc_ping(&self, host: Ipv4Addr, port: u16) -> Result<Contact> {
        let request = RpcRequest::Ping(PingRequest {
            sender: self.self_contact,
            msg_id: KadId::random(),
        });
        match tcp::call(SocketAddr::from((host, port)), &request, RPC_TIMEOUT).await? {
            RpcResponse::Pong(pong) => {
                self.routing.update(pong.sender).await;
                Ok(pong.sender)
            }
            _ => Err(NodeError::Network("unexpected reply to PING".to_string())),
        }
    }

    /// STORE a key/value pair at one peer.
    ///
    /// # Errors
    ///
    /// Transport failures and remote errors propagate.
    pub async fn rpc_store(&self, contact: &Contact, key: KadId, value: Vec<u8>) -> Result<()> {
        let request = RpcRequest::Store(StoreRequest {
            sender: self.self_contact,
            msg_id: KadId::random(),
            key,
            value,
        });
        match tcp::call(contact.addr(), &request, RPC_TIMEOUT).await? {
            RpcResponse::Store(reply) => match reply.error {
                None => Ok(()),
                Some(e) => Err(NodeError::Network(e)),
            },
            _ => Err(NodeError::Network("unexpected reply to STORE".to_string())),
        }
    }

    /// FIND_NODE at one peer; merge the returned contacts into the routing
    /// table before handing them back.
    ///
    /// # Errors
    ///
    /// Transport failures and remote errors propagate.
    pub async fn rpc_find_node(&self, contact: &Contact, target: KadId) -> Result<Vec<Contact>> {
        let request = RpcRequest::FindNode(FindNodeRequest {
            sender: self.self_contact,
            msg_id: KadId::random(),
            target,
        });
        match tcp::call(contact.addr(), &request, NODE_PROBE_TIMEOUT).await? {
            RpcResponse::FindNode(reply) => {
                if let Some(e) = reply.error {
                    return Err(NodeError::Network(e));
                }
                for c in &reply.nodes {
                    self.routing.update(*c).await;
                }
                Ok(reply.nodes)
            }
            _ => Err(NodeError::Network(
                "unexpected reply to FIND_NODE".to_string(),
            )),
        }
    }

    /// FIND_VALUE at one peer. A miss merges the returned contacts like
    /// [`Node::rpc_find_node`].
    ///
    /// # Errors
    ///
    /// Transport failures and remote errors propagate.
    pub async fn rpc_find_value(&self, contact: &Contact, key: KadId) -> Result<ValueReply> {
        let request = RpcRequest::FindValue(FindValueRequest {
            sender: self.self_contact,
            msg_id: KadId::random(),
            key,
        });
        match tcp::call(contact.addr(), &request, VALUE_PROBE_TIMEOUT).await? {
            RpcResponse::FindValue(reply) => {
                if let Some(e) = reply.error {
                    return Err(NodeError::Network(e));
                }
                if let Some(value) = reply.value {
                    return Ok(ValueReply::Value(value));
                }
                for c in &reply.nodes {
                    self.routing.update(*c).await;
                }
                Ok(ValueReply::Nodes(reply.nodes))
            }
            _ => Err(NodeError::Network(
                "unexpected reply to FIND_VALUE".to_string(),
            )),
        }
    }

    // -----------------------------------------------------------------
    // Iterative operations
    // -----------------------------------------------------------------

    /// Iteratively converge on the k closest contacts to `target`.
    pub async fn iterative_find_node(&self, target: KadId) -> Vec<Contact> {
        Lookup::new(self.clone(), target).run_node().await
    }

    /// Iteratively find the k closest contacts to `key` and STORE at each.
    ///
    /// Returns the contacts that acknowledged the store.
    pub async fn iterative_store(&self, key: KadId, value: Vec<u8>) -> Vec<Contact> {
        let contacts = self.iterative_find_node(key).await;
        let mut acknowledged = Vec::new();
        for contact in contacts {
            if self.rpc_store(&contact, key, value.clone()).await.is_ok() {
                acknowledged.push(contact);
            }
        }
        acknowledged
    }

    /// Iteratively search for a value.
    ///
    /// On a hit the value is cached locally and re-stored at the shortlist
    /// members, so a later lookup finds it closer to the key.
    pub async fn iterative_find_value(&self, key: KadId) -> ValueLookup {
        let outcome = Lookup::new(self.clone(), key).run_value().await;
        if let ValueLookup::Found { value, shortlist } = &outcome {
            self.store.put(key, value.clone()).await;
            for contact in shortlist {
                let _ = self.rpc_store(contact, key, value.clone()).await;
            }
        }
        outcome
    }

    // -----------------------------------------------------------------
    // String API
    // -----------------------------------------------------------------

    /// PING a peer; `"OK: Ping <contact>"` on success.
    pub async fn do_ping(&self, host: Ipv4Addr, port: u16) -> String {
        match self.rpc_ping(host, port).await {
            Ok(contact) => format!("OK: Ping {contact}"),
            Err(e) => format!("ERR: {e}"),
        }
    }

    /// STORE at one peer; `"OK: Stored ..."` on success.
    pub async fn do_store(&self, contact: &Contact, key: KadId, value: Vec<u8>) -> String {
        match self.rpc_store(contact, key, value).await {
            Ok(()) => format!("OK: Stored {key} at {}", contact.id),
            Err(e) => format!("ERR: {e}"),
        }
    }

    /// FIND_NODE at one peer; `"OK: Found nodes:"` plus ids on success.
    pub async fn do_find_node(&self, contact: &Contact, target: KadId) -> String {
        match self.rpc_find_node(contact, target).await {
            Ok(nodes) => format!("OK: Found nodes:{}", render_ids(&nodes)),
            Err(e) => format!("ERR: {e}"),
        }
    }

    /// FIND_VALUE at one peer; `"OK: Found value: ..."` or
    /// `"OK: Found nodes:"` plus ids.
    pub async fn do_find_value(&self, contact: &Contact, key: KadId) -> String {
        match self.rpc_find_value(contact, key).await {
            Ok(ValueReply::Value(value)) => {
                format!("OK: Found value: {}", String::from_utf8_lossy(&value))
            }
            Ok(ValueReply::Nodes(nodes)) => format!("OK: Found nodes:{}", render_ids(&nodes)),
            Err(e) => format!("ERR: {e}"),
        }
    }

    /// Local store lookup; `"OK: Found value: ..."` or `"ERR: Not Found"`.
    pub async fn local_find_value(&self, key: KadId) -> String {
        match self.store.get(key).await {
            Some(value) => format!("OK: Found value: {}", String::from_utf8_lossy(&value)),
            None => "ERR: Not Found".to_string(),
        }
    }

    /// Iterative node lookup; `"OK: Found <n> Nodes:"` plus ids.
    pub async fn do_iterative_find_node(&self, target: KadId) -> String {
        let nodes = self.iterative_find_node(target).await;
        format!("OK: Found {} Nodes:{}", nodes.len(), render_ids(&nodes))
    }

    /// Iterative store; reports how many peers acknowledged.
    pub async fn do_iterative_store(&self, key: KadId, value: Vec<u8>) -> String {
        let contacts = self.iterative_store(key, value).await;
        format!("OK: Stored {key} at {} nodes", contacts.len())
    }

    /// Iterative value lookup; `"OK: Found value: ..."` or `"ERR: Not Found"`.
    pub async fn do_iterative_find_value(&self, key: KadId) -> String {
        match self.iterative_find_value(key).await {
            ValueLookup::Found { value, .. } => {
                format!("OK: Found value: {}", String::from_utf8_lossy(&value))
            }
            ValueLookup::NotFound { .. } => "ERR: Not Found".to_string(),
        }
    }
}

fn render_ids(nodes: &[Contact]) -> String {
    nodes.iter().map(|c| format!(" {}", c.id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn local_node() -> Node {
        Node::start("127.0.0.1:0".parse().expect("addr"))
            .await
            .expect("start node")
    }

    #[tokio::test]
    async fn test_start_assigns_contact() {
        let node = local_node().await;
        let contact = node.self_contact();
        assert_eq!(contact.host, Ipv4Addr::LOCALHOST);
        assert_ne!(contact.port, 0);
    }

    #[tokio::test]
    async fn test_ping_records_both_sides() {
        let a = local_node().await;
        let b = local_node().await;

        let pinged = a
            .rpc_ping(b.self_contact().host, b.self_contact().port)
            .await
            .expect("ping");
        assert_eq!(pinged, b.self_contact());

        assert_eq!(a.find_contact(b.node_id()).await.expect("a knows b"), b.self_contact());

        // B records A off the reply path.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(b.find_contact(a.node_id()).await.expect("b knows a"), a.self_contact());
    }

    #[tokio::test]
    async fn test_do_ping_string_forms() {
        let a = local_node().await;
        let b = local_node().await;

        let ok = a.do_ping(b.self_contact().host, b.self_contact().port).await;
        assert!(ok.starts_with("OK: Ping "));
        assert!(ok.contains(&b.node_id().to_hex()));

        // Nothing listens on the reserved-then-dropped port.
        let closed = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = closed.local_addr().expect("addr").port();
        drop(closed);
        let err = a.do_ping(Ipv4Addr::LOCALHOST, port).await;
        assert!(err.starts_with("ERR: "));
    }

    #[tokio::test]
    async fn test_local_find_value_strings() {
        let node = local_node().await;
        let key = KadId::random();

        assert_eq!(node.local_find_value(key).await, "ERR: Not Found");

        node.local_put(key, b"hello world!".to_vec()).await;
        assert_eq!(
            node.local_find_value(key).await,
            "OK: Found value: hello world!"
        );
    }

    #[tokio::test]
    async fn test_store_and_find_value_between_nodes() {
        let a = local_node().await;
        let b = local_node().await;
        let key = KadId::random();

        a.rpc_ping(b.self_contact().host, b.self_contact().port)
            .await
            .expect("ping");

        let stored = a.do_store(&b.self_contact(), key, b"hello world!".to_vec()).await;
        assert!(stored.starts_with("OK: "));

        assert_eq!(
            b.local_find_value(key).await,
            "OK: Found value: hello world!"
        );
        assert_eq!(
            a.do_find_value(&b.self_contact(), key).await,
            "OK: Found value: hello world!"
        );

        let miss = a.do_find_value(&b.self_contact(), KadId::random()).await;
        assert!(miss.starts_with("OK: Found nodes:"));
    }
}
