//! The broker only ever needs to send a request to an endpoint and
//! await its reply; it never needs to know how that round trip
//! actually travels. [`EndpointHandle`] is that seam — the registry
//! stores one per connected endpoint (spec §3's "liveHandle") and the
//! Dispatcher calls through it without caring whether the endpoint is
//! an in-process test double or a real TCP peer.

pub mod channel;
pub mod tcp;

use async_trait::async_trait;
use thiserror::Error;

use crate::protocol::Request;
use crate::protocol::Response;

/// Failure to round-trip a request through an endpoint's transport —
/// distinct from the endpoint answering with an application-level
/// error, which travels inside a normal [`Response`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
	#[error("endpoint connection closed")]
	Closed,
	#[error("endpoint did not reply in time")]
	Timeout,
}

/// A live, addressable connection to one endpoint.
#[async_trait]
pub trait EndpointHandle: Send + Sync {
	async fn send(&self, request: Request) -> Result<Response, TransportError>;
}
