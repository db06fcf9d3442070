//! In-process transport used by tests and by same-binary wiring. A
//! request sent through [`ChannelTransport`] shows up on the paired
//! [`ChannelEndpointSide`] together with a one-shot reply slot —
//! nothing ever touches a socket.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use super::{EndpointHandle, TransportError};
use crate::protocol::{Request, Response};

type Call = (Request, oneshot::Sender<Response>);

/// Broker-side handle: what the registry stores and the Dispatcher
/// calls through.
pub struct ChannelTransport {
	sender: mpsc::UnboundedSender<Call>,
}

/// Endpoint-side receiver: an endpoint's protocol handler drains this
/// to learn about incoming requests and reply to each over its
/// one-shot slot.
pub struct ChannelEndpointSide {
	receiver: mpsc::UnboundedReceiver<Call>,
}

impl ChannelTransport {
	/// Build a connected pair: a handle for the registry to store, and
	/// the matching endpoint-side receiver.
	pub fn new_pair() -> (Self, ChannelEndpointSide) {
		let (sender, receiver) = mpsc::unbounded_channel();
		(Self { sender }, ChannelEndpointSide { receiver })
	}
}

impl ChannelEndpointSide {
	/// Await the next request, yielding it along with the slot to reply
	/// through. `None` once the broker-side handle has been dropped.
	pub async fn recv(&mut self) -> Option<(Request, oneshot::Sender<Response>)> {
		self.receiver.recv().await
	}
}

#[async_trait]
impl EndpointHandle for ChannelTransport {
	async fn send(&self, request: Request) -> Result<Response, TransportError> {
		let (reply_tx, reply_rx) = oneshot::channel();
		self.sender.send((request, reply_tx)).map_err(|_| TransportError::Closed)?;
		reply_rx.await.map_err(|_| TransportError::Closed)
	}
}
