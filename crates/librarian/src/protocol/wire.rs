//! Framing on top of the request/response contract.
//!
//! Spec §6 treats the wire format as an assumed external collaborator:
//! "a defined structured message format is assumed". We still need
//! *some* concrete framing to run two real OS processes against each
//! other (the `librarian`/`endpoint` binaries), so we pick one
//! newline-delimited JSON message per line, each request carrying a
//! correlation id so replies can be matched up on a shared duplex
//! stream. [`crate::transport`] is what actually reads/writes these.

use serde::{Deserialize, Serialize};

use super::{ConnectRequest, LibraryConnected, Request, Response};

/// A request or response paired with a correlation id so a duplex
/// connection can match replies to the call that produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
	pub id: u64,
	pub payload: T,
}

impl<T> Envelope<T> {
	pub fn new(id: u64, payload: T) -> Self {
		Self { id, payload }
	}
}

/// Messages an endpoint sends to the broker over its one long-lived
/// connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum EndpointToBroker {
	Connect(ConnectRequest),
	Response(Envelope<Response>),
}

/// Messages the broker sends to an endpoint over that same connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum BrokerToEndpoint {
	LibraryConnected(LibraryConnected),
	Request(Envelope<Request>),
}

/// The very first message on a freshly accepted broker connection.
/// Spec §6 reaches both endpoints and clients through the same
/// `library-service` address, so the broker tells the two apart by
/// what shows up first: an endpoint sends [`ConnectRequest`] to
/// register, a client sends its first [`Request`] directly (no
/// handshake — a client session is just a sequence of requests, each
/// tagged with a correlation id so pipelined replies can be matched
/// up).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum BrokerIncoming {
	Connect(ConnectRequest),
	Request(Envelope<Request>),
}

/// Messages a client sends to the broker after its first request —
/// structurally identical to [`BrokerIncoming::Request`], kept as its
/// own name so a client session's steady state reads as client
/// traffic rather than "more handshake candidates".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ClientToBroker {
	Request(Envelope<Request>),
}

/// Messages the broker sends back to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum BrokerToClient {
	Response(Envelope<Response>),
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::protocol::SearchResponse;

	#[test]
	fn endpoint_to_broker_round_trips_through_json() {
		let msg = EndpointToBroker::Response(Envelope::new(7, Response::Search(SearchResponse::empty())));
		let json = serde_json::to_string(&msg).unwrap();
		let back: EndpointToBroker = serde_json::from_str(&json).unwrap();
		match back {
			EndpointToBroker::Response(env) => assert_eq!(env.id, 7),
			_ => panic!("expected Response variant"),
		}
	}

	#[test]
	fn broker_to_endpoint_connect_ack_round_trips() {
		let msg = BrokerToEndpoint::LibraryConnected(LibraryConnected::accepted("K1", "g1"));
		let json = serde_json::to_string(&msg).unwrap();
		let back: BrokerToEndpoint = serde_json::from_str(&json).unwrap();
		match back {
			BrokerToEndpoint::LibraryConnected(ack) => assert_eq!(ack.key, "K1"),
			_ => panic!("expected LibraryConnected variant"),
		}
	}

	#[test]
	fn broker_incoming_distinguishes_connect_from_client_request() {
		use crate::protocol::SearchRequest;
		use crate::types::ResourceType;

		let connect = BrokerIncoming::Connect(ConnectRequest::new("h", 1, [ResourceType::Page].into_iter().collect()));
		let json = serde_json::to_string(&connect).unwrap();
		assert!(matches!(serde_json::from_str::<BrokerIncoming>(&json).unwrap(), BrokerIncoming::Connect(_)));

		let req = BrokerIncoming::Request(Envelope::new(1, Request::Search(SearchRequest::new("q", [ResourceType::Page].into_iter().collect()))));
		let json = serde_json::to_string(&req).unwrap();
		assert!(matches!(serde_json::from_str::<BrokerIncoming>(&json).unwrap(), BrokerIncoming::Request(_)));
	}
}
