//! Fans a routed request out to its targets, merges the replies, and
//! absorbs per-endpoint failure into the response contract (spec
//! §4.4) instead of ever surfacing a transport error to the client.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use crate::protocol::{LookupResponse, Request, Response, SearchResponse};
use crate::registry::{Registry, RegistryError, RegistrySnapshot};
use crate::router::route;
use crate::transport::{EndpointHandle, TransportError};

const NO_LIBRARY_SUPPORT: &str = "No library support for this operation…";
const ERROR_IN_RESPONSES: &str = "Error in responses from libraries…";

/// Per-endpoint call deadline (spec §5: "configurable; default
/// bounded, e.g., 30 s").
const DEFAULT_ENDPOINT_TIMEOUT: Duration = Duration::from_secs(30);

/// Routes and dispatches client requests against a [`Registry`],
/// merging responses per spec §4.4.
pub struct Dispatcher {
	registry: Arc<Registry>,
	endpoint_timeout: Duration,
}

impl Dispatcher {
	pub fn new(registry: Arc<Registry>) -> Self {
		Self { registry, endpoint_timeout: DEFAULT_ENDPOINT_TIMEOUT }
	}

	pub fn with_endpoint_timeout(mut self, timeout: Duration) -> Self {
		self.endpoint_timeout = timeout;
		self
	}

	/// Route and dispatch one client request, producing a response that
	/// never carries a raw transport failure — every failure mode is
	/// folded into the response contract (spec §7).
	pub async fn dispatch(&self, request: Request) -> Response {
		let snapshot = self.registry.snapshot();

		// Lookups are scoped to exactly one claimed owner and get their
		// own short-circuit: an unregistered key never reaches the
		// network (spec §4.4).
		if let Request::Lookup(lookup) = &request {
			let Some(record) = snapshot.endpoint(&lookup.id.resource_id) else {
				let stub_id = crate::types::AccessIdentifier::error_stub(
					lookup.id.identifier.clone(),
					lookup.id.resource_id.clone(),
					format!("Received lookup with unrecognized resource ID: {}", lookup.id.resource_id),
				);
				return Response::Lookup(LookupResponse::stub(stub_id));
			};
			return match self.call_with_timeout(record.handle.clone(), request).await {
				Ok(response) => response,
				Err(_) => {
					let stub_id = crate::types::AccessIdentifier::error_stub(
						lookup.id.identifier.clone(),
						lookup.id.resource_id.clone(),
						"Received lookup with unrecognized resource ID: endpoint unreachable".to_string(),
					);
					Response::Lookup(LookupResponse::stub(stub_id))
				},
			};
		}

		let targets = match route(&request, &snapshot) {
			Ok(targets) => targets,
			// A transform scoped to an unregistered access id has no
			// group to search within, which is the same observable
			// outcome as routing to zero targets.
			Err(RegistryError::UnknownResource(_)) => Vec::new(),
			Err(other) => return Response::Search(SearchResponse::with_error(other.to_string())),
		};

		Response::Search(self.dispatch_search_like(request, &snapshot, targets).await)
	}

	async fn dispatch_search_like(&self, request: Request, snapshot: &RegistrySnapshot, targets: Vec<String>) -> SearchResponse {
		match targets.len() {
			0 => SearchResponse::with_error(NO_LIBRARY_SUPPORT),

			1 => {
				let Some(record) = snapshot.endpoint(&targets[0]) else {
					return SearchResponse::with_error(NO_LIBRARY_SUPPORT);
				};
				match self.call_with_timeout(record.handle.clone(), request).await {
					Ok(Response::Search(resp)) => resp,
					Ok(Response::Lookup(_)) => SearchResponse::with_error(ERROR_IN_RESPONSES),
					Err(_) => SearchResponse::with_error(ERROR_IN_RESPONSES),
				}
			},

			_ => {
				let calls: Vec<_> = targets.iter().filter_map(|key| snapshot.endpoint(key).map(|r| r.handle.clone())).collect();
				let futures = calls.into_iter().map(|handle| {
					let request = request.clone();
					async move { self.call_with_timeout(handle, request).await }
				});
				let results = join_all(futures).await;

				let mut merged = Vec::new();
				let mut any_succeeded = false;
				for result in results {
					if let Ok(Response::Search(resp)) = result {
						any_succeeded = true;
						merged.extend(resp.results);
					}
				}

				if any_succeeded {
					SearchResponse { results: merged, error: None }
				} else {
					SearchResponse::with_error(ERROR_IN_RESPONSES)
				}
			},
		}
	}

	async fn call_with_timeout(&self, handle: Arc<dyn EndpointHandle>, request: Request) -> Result<Response, TransportError> {
		match tokio::time::timeout(self.endpoint_timeout, handle.send(request)).await {
			Ok(result) => result,
			Err(_) => Err(TransportError::Timeout),
		}
	}
}

#[cfg(test)]
mod tests {
	use async_trait::async_trait;

	use super::*;
	use crate::protocol::{LookupRequest, ResourceRecord, SearchRequest, SearchResult};
	use crate::types::{AccessIdentifier, ResourceType};

	struct StubEndpoint {
		response: Response,
	}

	#[async_trait]
	impl EndpointHandle for StubEndpoint {
		async fn send(&self, _request: Request) -> Result<Response, TransportError> {
			Ok(self.response.clone())
		}
	}

	struct FailingEndpoint;

	#[async_trait]
	impl EndpointHandle for FailingEndpoint {
		async fn send(&self, _request: Request) -> Result<Response, TransportError> {
			Err(TransportError::Closed)
		}
	}

	fn search_result(resource_id: &str) -> SearchResult {
		let id = AccessIdentifier::new("i", resource_id);
		SearchResult { id: id.clone(), record: ResourceRecord::new(id, ResourceType::Page) }
	}

	async fn registry_with(key: &str, group_id: &str, types: &[ResourceType], handle: Arc<dyn EndpointHandle>) -> Arc<Registry> {
		let registry = Arc::new(Registry::new());
		let req = crate::protocol::ConnectRequest::new("h", 1, types.iter().copied().collect())
			.with_requested_key(key)
			.with_group_id(group_id);
		registry.connect(req, handle);
		registry
	}

	#[tokio::test]
	async fn zero_targets_yields_no_library_support() {
		let registry = Arc::new(Registry::new());
		let dispatcher = Dispatcher::new(registry);
		let req = Request::Search(SearchRequest::new("q", [ResourceType::Page].into_iter().collect()));
		let resp = dispatcher.dispatch(req).await.unwrap_search();
		assert!(resp.is_error());
		assert!(resp.results.is_empty());
	}

	#[tokio::test]
	async fn single_target_forwards_response_as_is() {
		let handle = Arc::new(StubEndpoint { response: Response::Search(SearchResponse { results: vec![search_result("K1")], error: None }) });
		let registry = registry_with("K1", "g", &[ResourceType::Page], handle).await;
		let dispatcher = Dispatcher::new(registry);
		let req = Request::Search(SearchRequest::new("q", [ResourceType::Page].into_iter().collect()));
		let resp = dispatcher.dispatch(req).await.unwrap_search();
		assert_eq!(resp.results.len(), 1);
		assert!(!resp.is_error());
	}

	#[tokio::test]
	async fn two_targets_concatenate_results_with_no_error() {
		let registry = Arc::new(Registry::new());
		let h1 = Arc::new(StubEndpoint { response: Response::Search(SearchResponse { results: vec![search_result("K1")], error: None }) });
		let h2 = Arc::new(StubEndpoint { response: Response::Search(SearchResponse { results: vec![search_result("K2")], error: None }) });
		registry.connect(
			crate::protocol::ConnectRequest::new("h1", 1, [ResourceType::Page].into_iter().collect())
				.with_requested_key("K1")
				.with_group_id("g"),
			h1,
		);
		registry.connect(
			crate::protocol::ConnectRequest::new("h2", 2, [ResourceType::Page].into_iter().collect())
				.with_requested_key("K2")
				.with_group_id("g"),
			h2,
		);
		let dispatcher = Dispatcher::new(registry);
		let req = Request::Search(SearchRequest::new("q", [ResourceType::Page].into_iter().collect()));
		let resp = dispatcher.dispatch(req).await.unwrap_search();
		assert_eq!(resp.results.len(), 2);
		assert!(!resp.is_error());
	}

	#[tokio::test]
	async fn total_fan_out_failure_surfaces_generic_error() {
		let registry = registry_with("K1", "g", &[ResourceType::Page], Arc::new(FailingEndpoint)).await;
		let dispatcher = Dispatcher::new(registry);
		let req = Request::Search(SearchRequest::new("q", [ResourceType::Page].into_iter().collect()));
		let resp = dispatcher.dispatch(req).await.unwrap_search();
		assert!(resp.is_error());
		assert!(resp.results.is_empty());
	}

	#[tokio::test]
	async fn partial_failure_returns_successes_with_no_error() {
		let registry = Arc::new(Registry::new());
		let ok_handle = Arc::new(StubEndpoint { response: Response::Search(SearchResponse { results: vec![search_result("K1")], error: None }) });
		registry.connect(
			crate::protocol::ConnectRequest::new("h1", 1, [ResourceType::Page].into_iter().collect())
				.with_requested_key("K1")
				.with_group_id("g"),
			ok_handle,
		);
		registry.connect(
			crate::protocol::ConnectRequest::new("h2", 2, [ResourceType::Page].into_iter().collect())
				.with_requested_key("K2")
				.with_group_id("g"),
			Arc::new(FailingEndpoint),
		);
		let dispatcher = Dispatcher::new(registry);
		let req = Request::Search(SearchRequest::new("q", [ResourceType::Page].into_iter().collect()));
		let resp = dispatcher.dispatch(req).await.unwrap_search();
		assert!(!resp.is_error());
		assert_eq!(resp.results.len(), 1);
	}

	#[tokio::test]
	async fn lookup_with_unregistered_key_produces_stub_without_network_call() {
		let registry = Arc::new(Registry::new());
		let dispatcher = Dispatcher::new(registry);
		let id = AccessIdentifier::new("i", "ZZZZ");
		let req = Request::Lookup(LookupRequest::new(ResourceType::Page, id));
		let resp = dispatcher.dispatch(req).await.unwrap_lookup();
		assert!(resp.id.is_error());
		assert_eq!(resp.id.error.as_deref(), Some("Received lookup with unrecognized resource ID: ZZZZ"));
	}

	#[tokio::test]
	async fn lookup_against_registered_key_forwards_to_its_endpoint() {
		let record_id = AccessIdentifier::new("i", "K1");
		let handle = Arc::new(StubEndpoint {
			response: Response::Lookup(LookupResponse::found(ResourceRecord::new(record_id.clone(), ResourceType::Page))),
		});
		let registry = registry_with("K1", "g", &[ResourceType::Page], handle).await;
		let dispatcher = Dispatcher::new(registry);
		let req = Request::Lookup(LookupRequest::new(ResourceType::Page, record_id));
		let resp = dispatcher.dispatch(req).await.unwrap_lookup();
		assert!(!resp.id.is_error());
		assert!(resp.record.is_some());
	}
}
