//! The mirror image of the broker: runs inside each backend process,
//! registers once on startup, and serves incoming requests by
//! delegating to a local [`DataStore`] (spec §4.5).

mod data_store;
mod link;

pub use data_store::DataStore;
pub use link::BrokerLink;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::protocol::wire::{BrokerToEndpoint, Envelope, EndpointToBroker};
use crate::protocol::{ConnectRequest, LookupResponse, Request, Response, SearchResponse, TransformKind};
use crate::transport::channel::ChannelEndpointSide;
use crate::types::AccessIdentifier;

/// Where an endpoint is in its connection lifecycle (spec §4.5's state
/// diagram).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointState {
	Disconnected,
	AwaitingAck,
	Serving,
	Terminated,
}

/// Drives one endpoint process: owns the [`DataStore`] it serves
/// requests from and the key the broker assigned it.
pub struct Endpoint<D> {
	data_store: D,
	state: Mutex<EndpointState>,
	assigned_key: Mutex<Option<String>>,
}

impl<D: DataStore> Endpoint<D> {
	pub fn new(data_store: D) -> Self {
		Self { data_store, state: Mutex::new(EndpointState::Disconnected), assigned_key: Mutex::new(None) }
	}

	pub fn state(&self) -> EndpointState {
		*self.state.lock()
	}

	pub fn assigned_key(&self) -> Option<String> {
		self.assigned_key.lock().clone()
	}

	/// Drive one connection's full lifecycle over `link`: send
	/// `connect_request`, await the ack, then serve requests until the
	/// broker closes the connection.
	pub async fn run(&self, mut link: impl BrokerLink, connect_request: ConnectRequest) {
		*self.state.lock() = EndpointState::AwaitingAck;
		if link.send_to_broker(EndpointToBroker::Connect(connect_request)).await.is_err() {
			*self.state.lock() = EndpointState::Terminated;
			return;
		}

		let ack = loop {
			match link.recv_from_broker().await {
				Some(BrokerToEndpoint::LibraryConnected(ack)) => break ack,
				Some(BrokerToEndpoint::Request(_)) => continue,
				None => {
					*self.state.lock() = EndpointState::Terminated;
					return;
				},
			}
		};

		if !ack.is_accepted() {
			warn!(target: "endpoint", error = ?ack.error, "connect refused, staying disconnected");
			*self.state.lock() = EndpointState::Disconnected;
			return;
		}

		// The broker's key is canonical even if we requested one (spec
		// §4.5: "overwriting any previously-requested key").
		*self.assigned_key.lock() = Some(ack.key.clone());
		*self.state.lock() = EndpointState::Serving;
		info!(target: "endpoint", key = %ack.key, "connected and serving");

		loop {
			match link.recv_from_broker().await {
				Some(BrokerToEndpoint::Request(Envelope { id, payload })) => {
					let response = self.handle_request(payload).await;
					if link.send_to_broker(EndpointToBroker::Response(Envelope::new(id, response))).await.is_err() {
						break;
					}
				},
				Some(BrokerToEndpoint::LibraryConnected(_)) => continue,
				None => break,
			}
		}

		*self.state.lock() = EndpointState::Terminated;
		info!(target: "endpoint", "broker connection closed");
	}

	/// Serve requests arriving over an in-process
	/// [`crate::transport::channel::ChannelTransport`], as if the
	/// connect handshake already granted `key` — useful for wiring an
	/// endpoint directly into the same process as the broker (tests,
	/// or a data store embedded in the broker binary itself) without
	/// going through a socket.
	pub async fn serve_channel(&self, mut endpoint_side: ChannelEndpointSide, key: impl Into<String>) {
		*self.assigned_key.lock() = Some(key.into());
		*self.state.lock() = EndpointState::Serving;
		while let Some((request, reply_tx)) = endpoint_side.recv().await {
			let response = self.handle_request(request).await;
			if reply_tx.send(response).is_err() {
				break;
			}
		}
		*self.state.lock() = EndpointState::Terminated;
	}

	async fn handle_request(&self, request: Request) -> Response {
		match request {
			Request::Search(req) => Response::Search(self.prepare_to_send(self.data_store.run_search(&req).await)),
			Request::Transform(req) => {
				let resp = match &req.kind {
					TransformKind::Container => self.data_store.run_container_transform(&req).await,
					TransformKind::Contents => self.data_store.run_contents_transform(&req).await,
					TransformKind::Overlaps => self.data_store.run_overlaps(&req).await,
					TransformKind::OccurAsObj => self.data_store.run_occur_as_obj(&req).await,
					TransformKind::OccurAsSubj => self.data_store.run_occur_as_subj(&req).await,
					TransformKind::OccurHasObj => self.data_store.run_occur_has_obj(&req).await,
					TransformKind::OccurHasSubj => self.data_store.run_occur_has_subj(&req).await,
					TransformKind::NearbyLocations => self.data_store.run_nearby_locations(&req).await,
					TransformKind::Dynamic(dt_id) => self.data_store.run_dynamic(dt_id, &req).await,
				};
				Response::Search(self.prepare_to_send(resp))
			},
			Request::Lookup(req) => Response::Lookup(self.serve_lookup(req).await),
		}
	}

	async fn serve_lookup(&self, req: crate::protocol::LookupRequest) -> LookupResponse {
		let ours = self.assigned_key.lock().clone().unwrap_or_default();
		if req.id.resource_id != ours {
			return LookupResponse::stub(AccessIdentifier::error_stub(
				req.id.identifier.clone(),
				req.id.resource_id.clone(),
				format!("Received lookup with mismatched resource ID: {} vs {}", req.id.resource_id, ours),
			));
		}
		self.data_store.lookup(req.kind, &req.id).await
	}

	/// Stamp every result's `id.resourceId` with our assigned key before
	/// it leaves the process (spec §4.5's `prepareToSend`), so the
	/// broker can route subsequent transforms back to us regardless of
	/// what the data store itself put there.
	fn prepare_to_send(&self, mut response: SearchResponse) -> SearchResponse {
		if let Some(key) = self.assigned_key.lock().clone() {
			for result in &mut response.results {
				result.id.resource_id = key.clone();
			}
		}
		response
	}
}
