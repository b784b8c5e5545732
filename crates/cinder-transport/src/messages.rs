//! RPC message payloads for the four Cinder DHT operations.
//!
//! Every request carries the sender's [`Contact`] (so the receiving node can
//! record its liveness) and a random `msg_id` that the response must echo.
//! Responses never carry transport-level failures; a handler that cannot
//! serve a request sets the `error` field instead.

use serde::{Deserialize, Serialize};

use cinder_types::{Contact, KadId};

/// PING request payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PingRequest {
    /// The caller's contact record.
    pub sender: Contact,
    /// Random message id, echoed in the pong.
    pub msg_id: KadId,
}

/// PING response payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PongReply {
    /// Echo of the request's message id.
    pub msg_id: KadId,
    /// The responder's contact record.
    pub sender: Contact,
}

/// STORE request payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreRequest {
    /// The caller's contact record.
    pub sender: Contact,
    /// Random message id, echoed in the reply.
    pub msg_id: KadId,
    /// The key to store under.
    pub key: KadId,
    /// The value bytes. Last write wins.
    pub value: Vec<u8>,
}

/// STORE acknowledgement.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreReply {
    /// Echo of the request's message id.
    pub msg_id: KadId,
    /// Set when the store could not be served.
    pub error: Option<String>,
}

/// FIND_NODE request payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FindNodeRequest {
    /// The caller's contact record.
    pub sender: Contact,
    /// Random message id, echoed in the reply.
    pub msg_id: KadId,
    /// The identifier to find contacts near.
    pub target: KadId,
}

/// FIND_NODE response payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FindNodeReply {
    /// Echo of the request's message id.
    pub msg_id: KadId,
    /// Up to k contacts closest to the target, nearest first.
    pub nodes: Vec<Contact>,
    /// Set when the lookup could not be served.
    pub error: Option<String>,
}

/// FIND_VALUE request payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FindValueRequest {
    /// The caller's contact record.
    pub sender: Contact,
    /// Random message id, echoed in the reply.
    pub msg_id: KadId,
    /// The key to look up.
    pub key: KadId,
}

/// FIND_VALUE response payload.
///
/// When `value` is set the responder holds the key and `nodes` is empty;
/// otherwise `nodes` carries the closest contacts as in [`FindNodeReply`].
/// Callers branch on `value.is_some()`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FindValueReply {
    /// Echo of the request's message id.
    pub msg_id: KadId,
    /// The stored value, if the responder holds the key.
    pub value: Option<Vec<u8>>,
    /// Closest contacts to the key when the value is absent.
    pub nodes: Vec<Contact>,
    /// Set when the lookup could not be served.
    pub error: Option<String>,
}

/// An inbound RPC request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum RpcRequest {
    /// Liveness probe.
    Ping(PingRequest),
    /// Store a key/value pair.
    Store(StoreRequest),
    /// Find the closest contacts to an identifier.
    FindNode(FindNodeRequest),
    /// Find a value, falling back to the closest contacts.
    FindValue(FindValueRequest),
}

impl RpcRequest {
    /// The caller's contact record.
    pub fn sender(&self) -> &Contact {
        match self {
            RpcRequest::Ping(r) => &r.sender,
            RpcRequest::Store(r) => &r.sender,
            RpcRequest::FindNode(r) => &r.sender,
            RpcRequest::FindValue(r) => &r.sender,
        }
    }

    /// The request's message id.
    pub fn msg_id(&self) -> KadId {
        match self {
            RpcRequest::Ping(r) => r.msg_id,
            RpcRequest::Store(r) => r.msg_id,
            RpcRequest::FindNode(r) => r.msg_id,
            RpcRequest::FindValue(r) => r.msg_id,
        }
    }
}

/// An RPC response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum RpcResponse {
    /// Reply to [`RpcRequest::Ping`].
    Pong(PongReply),
    /// Reply to [`RpcRequest::Store`].
    Store(StoreReply),
    /// Reply to [`RpcRequest::FindNode`].
    FindNode(FindNodeReply),
    /// Reply to [`RpcRequest::FindValue`].
    FindValue(FindValueReply),
}

impl RpcResponse {
    /// The echoed message id.
    pub fn msg_id(&self) -> KadId {
        match self {
            RpcResponse::Pong(r) => r.msg_id,
            RpcResponse::Store(r) => r.msg_id,
            RpcResponse::FindNode(r) => r.msg_id,
            RpcResponse::FindValue(r) => r.msg_id,
        }
    }
}
