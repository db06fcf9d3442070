//! What an endpoint talks to the broker through — abstracted so the
//! state machine in [`super::Endpoint`] doesn't care whether it's
//! driving a real socket or an in-process test double.

use async_trait::async_trait;

use crate::protocol::wire::{BrokerToEndpoint, EndpointToBroker};

/// The broker connection closed or failed; the endpoint should stop
/// serving.
#[derive(Debug)]
pub struct LinkClosed;

/// One endpoint's duplex connection to the broker.
#[async_trait]
pub trait BrokerLink: Send {
	async fn send_to_broker(&mut self, msg: EndpointToBroker) -> Result<(), LinkClosed>;
	async fn recv_from_broker(&mut self) -> Option<BrokerToEndpoint>;
}

#[async_trait]
impl BrokerLink for crate::transport::tcp::TcpLink {
	async fn send_to_broker(&mut self, msg: EndpointToBroker) -> Result<(), LinkClosed> {
		crate::transport::tcp::TcpLink::send_to_broker(self, &msg).await.map_err(|_| LinkClosed)
	}

	async fn recv_from_broker(&mut self) -> Option<BrokerToEndpoint> {
		crate::transport::tcp::TcpLink::recv_from_broker(self).await.ok().flatten()
	}
}
