//! CBOR serialization helpers for the Cinder wire protocol.
//!
//! Wraps [`ciborium`] to serialize RPC payloads to/from CBOR (RFC 8949).
//! Every frame on the wire is a single CBOR-encoded [`RpcRequest`] or
//! [`RpcResponse`](crate::messages::RpcResponse).
//!
//! [`RpcRequest`]: crate::messages::RpcRequest

use serde::{de::DeserializeOwned, Serialize};

use crate::TransportError;

/// Serialize a value to CBOR bytes.
///
/// # Errors
///
/// Returns [`TransportError::Serialization`] if the value cannot be serialized.
pub fn to_vec<T: Serialize>(value: &T) -> Result<Vec<u8>, TransportError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf)
        .map_err(|e| TransportError::Serialization(format!("CBOR serialization failed: {e}")))?;
    Ok(buf)
}

/// Deserialize a value from CBOR bytes.
///
/// # Errors
///
/// Returns [`TransportError::Deserialization`] if the bytes cannot be
/// deserialized into the target type.
pub fn from_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T, TransportError> {
    ciborium::from_reader(data)
        .map_err(|e| TransportError::Deserialization(format!("CBOR deserialization failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{PingRequest, RpcRequest};
    use cinder_types::{Contact, KadId};
    use std::net::Ipv4Addr;

    fn ping() -> RpcRequest {
        RpcRequest::Ping(PingRequest {
            sender: Contact::new(KadId::random(), Ipv4Addr::LOCALHOST, 7890),
            msg_id: KadId::random(),
        })
    }

    #[test]
    fn test_roundtrip_request() {
        let request = ping();
        let bytes = to_vec(&request).expect("serialize");
        let restored: RpcRequest = from_slice(&bytes).expect("deserialize");
        assert_eq!(restored.msg_id(), request.msg_id());
        assert_eq!(restored.sender().id, request.sender().id);
    }

    #[test]
    fn test_invalid_data_returns_error() {
        let result: Result<RpcRequest, _> = from_slice(&[0xFF, 0xFF, 0xFF]);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_data_returns_error() {
        let result: Result<RpcRequest, _> = from_slice(&[]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cbor_is_compact() {
        let request = ping();
        let cbor = to_vec(&request).expect("serialize");
        let json = serde_json::to_vec(&request).expect("serialize json");
        assert!(cbor.len() <= json.len());
    }
}
