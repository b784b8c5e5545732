//! Inbound RPC handling.
//!
//! Each accepted request is served by [`NodeRpc`]: it records the sender's
//! liveness in the routing table *asynchronously* (the reply must never
//! block on bucket bookkeeping, since a full bucket means a liveness
//! probe), echoes the message id, and dispatches on the operation.

use cinder_transport::messages::{
    FindNodeReply, FindValueReply, PongReply, RpcRequest, RpcResponse, StoreReply,
};
use cinder_transport::tcp::RpcHandler;
use cinder_types::Contact;

use crate::kbuckets::RoutingHandle;
use crate::store::StoreHandle;

/// The node's RPC surface: routing table + local store behind the four
/// wire operations.
pub struct NodeRpc {
    self_contact: Contact,
    routing: RoutingHandle,
    store: StoreHandle,
}

impl NodeRpc {
    /// Create the RPC surface over the node's coordinators.
    pub fn new(self_contact: Contact, routing: RoutingHandle, store: StoreHandle) -> Self {
        Self {
            self_contact,
            routing,
            store,
        }
    }

    /// Record the sender without blocking the reply path.
    fn touch_sender(&self, sender: Contact) {
        let routing = self.routing.clone();
        tokio::spawn(async move {
            routing.update(sender).await;
        });
    }
}

impl RpcHandler for NodeRpc {
    async fn handle(&self, request: RpcRequest) -> RpcResponse {
        self.touch_sender(*request.sender());

        match request {
            RpcRequest::Ping(ping) => RpcResponse::Pong(PongReply {
                msg_id: ping.msg_id,
                sender: self.self_contact,
            }),
            RpcRequest::Store(store) => {
                self.store.put(store.key, store.value).await;
                RpcResponse::Store(StoreReply {
                    msg_id: store.msg_id,
                    error: None,
                })
            }
            RpcRequest::FindNode(find) => {
                let nodes = self.routing.find_closest(find.target).await;
                RpcResponse::FindNode(FindNodeReply {
                    msg_id: find.msg_id,
                    nodes,
                    error: None,
                })
            }
            RpcRequest::FindValue(find) => match self.store.get(find.key).await {
                Some(value) => RpcResponse::FindValue(FindValueReply {
                    msg_id: find.msg_id,
                    value: Some(value),
                    nodes: Vec::new(),
                    error: None,
                }),
                None => {
                    let nodes = self.routing.find_closest(find.key).await;
                    RpcResponse::FindValue(FindValueReply {
                        msg_id: find.msg_id,
                        value: None,
                        nodes,
                        error: None,
                    })
                }
            },
        }
    }
}
