//! An illustrative [`DataStore`] backed by nothing but `rand` and
//! `uuid`: every search, transform, and lookup manufactures plausible-
//! looking resource records on the spot. Spec §1 calls this kind of
//! endpoint "illustrative only" — it exists to give the broker
//! something to talk to without requiring a real backend, and its
//! payloads are intentionally non-deterministic (spec §8's lookup-
//! idempotence law is stated "modulo non-deterministic payload in a
//! demo endpoint" for exactly this reason).

use std::collections::HashSet;

use async_trait::async_trait;
use librarian::endpoint::DataStore;
use librarian::protocol::{LookupResponse, ResourceRecord, SearchRequest, SearchResponse, SearchResult, TransformRequest};
use librarian::types::{AccessIdentifier, ContainmentRelation, DynamicTransformId, ResourceType};
use rand::Rng;

/// The one dynamic transform this demo advertises, overloaded across
/// every resource type (spec §3: the same name may be overloaded
/// across different `fromType`s).
pub const RELATED_RANDOM: &str = "relatedRandom";

pub struct RandomDataStore {
	supported_types: HashSet<ResourceType>,
}

impl RandomDataStore {
	/// Supports every resource type — a real backend would narrow this
	/// to whatever it actually stores.
	pub fn new() -> Self {
		Self { supported_types: ResourceType::ALL.into_iter().collect() }
	}

	pub fn dynamic_transforms(&self) -> Vec<DynamicTransformId> {
		self.supported_types.iter().map(|&t| DynamicTransformId::new(RELATED_RANDOM, t)).collect()
	}

	pub fn supported_types(&self) -> HashSet<ResourceType> {
		self.supported_types.clone()
	}

	fn unsupported_type_response(&self, t: ResourceType) -> SearchResponse {
		SearchResponse::with_error(format!("{t} is not a type this endpoint supports"))
	}

	/// Manufacture `count` random records of `kind`. The `resourceId` on
	/// each result is a placeholder — the endpoint-side handler stamps
	/// it with our broker-assigned key before the response leaves the
	/// process (spec §4.5, `prepareToSend`), so what we put here never
	/// actually reaches the client.
	fn random_results(&self, kind: ResourceType, count: u32) -> Vec<SearchResult> {
		(0..count).map(|_| random_result(kind)).collect()
	}
}

impl Default for RandomDataStore {
	fn default() -> Self {
		Self::new()
	}
}

fn random_result(kind: ResourceType) -> SearchResult {
	let id = AccessIdentifier::new(uuid::Uuid::new_v4().to_string(), "unstamped");
	let record = random_record(id.clone(), kind);
	SearchResult { id, record }
}

fn random_record(id: AccessIdentifier, kind: ResourceType) -> ResourceRecord {
	let mut rng = rand::rng();
	let title = format!("{kind} #{:04}", rng.random_range(0..10_000));
	let mut attributes = serde_json::Map::new();
	attributes.insert("relevance".to_string(), serde_json::json!(rng.random_range(0.0..1.0)));
	ResourceRecord { id, resource_type: kind, title: Some(title), attributes }
}

/// Pick a plausible result type for a transform given its `from`/`to`
/// type hints, falling back to whatever the containment relation
/// allows. Returns `None` when nothing fits, which the caller turns
/// into an empty, error-free response (spec §4.5's "supported type,
/// unsupported operation" case).
fn pick_result_type(preferred: Option<ResourceType>, fallback_from: Option<ResourceType>) -> Option<ResourceType> {
	if let Some(t) = preferred {
		return Some(t);
	}
	let from = fallback_from?;
	ContainmentRelation::contents_of(from).first().copied().or_else(|| ContainmentRelation::containers_of(from).first().copied())
}

#[async_trait]
impl DataStore for RandomDataStore {
	async fn run_search(&self, req: &SearchRequest) -> SearchResponse {
		let matching: Vec<ResourceType> = req.types.iter().copied().filter(|t| self.supported_types.contains(t)).collect();
		if matching.is_empty() {
			return SearchResponse::with_error("none of the requested types are held by this endpoint");
		}
		let total = req.params.num_requested.unwrap_or(10).max(1);
		let per_type = (total / matching.len() as u32).max(1);
		let results = matching.into_iter().flat_map(|t| self.random_results(t, per_type)).collect();
		SearchResponse { results, error: None }
	}

	async fn run_container_transform(&self, req: &TransformRequest) -> SearchResponse {
		self.run_typed_transform(req, req.from_type)
	}

	async fn run_contents_transform(&self, req: &TransformRequest) -> SearchResponse {
		self.run_typed_transform(req, req.to_type)
	}

	async fn run_overlaps(&self, req: &TransformRequest) -> SearchResponse {
		self.run_typed_transform(req, req.from_type)
	}

	async fn run_occur_as_obj(&self, req: &TransformRequest) -> SearchResponse {
		self.run_typed_transform(req, req.from_type)
	}

	async fn run_occur_as_subj(&self, req: &TransformRequest) -> SearchResponse {
		self.run_typed_transform(req, req.from_type)
	}

	async fn run_occur_has_obj(&self, req: &TransformRequest) -> SearchResponse {
		self.run_typed_transform(req, req.from_type)
	}

	async fn run_occur_has_subj(&self, req: &TransformRequest) -> SearchResponse {
		self.run_typed_transform(req, req.from_type)
	}

	async fn run_nearby_locations(&self, _req: &TransformRequest) -> SearchResponse {
		if !self.supported_types.contains(&ResourceType::Location) {
			return self.unsupported_type_response(ResourceType::Location);
		}
		SearchResponse { results: self.random_results(ResourceType::Location, 3), error: None }
	}

	async fn run_dynamic(&self, dt_id: &DynamicTransformId, req: &TransformRequest) -> SearchResponse {
		if dt_id.name != RELATED_RANDOM {
			// A name we don't implement: supported type, unsupported
			// operation (spec §4.5's non-support contract).
			return SearchResponse::empty();
		}
		self.run_typed_transform(req, Some(dt_id.from_type))
	}

	async fn lookup(&self, kind: ResourceType, id: &AccessIdentifier) -> LookupResponse {
		if !self.supported_types.contains(&kind) {
			return LookupResponse::stub(AccessIdentifier::error_stub(id.identifier.clone(), id.resource_id.clone(), format!("{kind} is not a type this endpoint supports")));
		}
		LookupResponse::found(random_record(id.clone(), kind))
	}
}

impl RandomDataStore {
	fn run_typed_transform(&self, req: &TransformRequest, preferred: Option<ResourceType>) -> SearchResponse {
		let Some(result_type) = pick_result_type(preferred, req.from_type) else {
			return SearchResponse::empty();
		};
		if !self.supported_types.contains(&result_type) {
			return self.unsupported_type_response(result_type);
		}
		let count = req.params.num_requested.unwrap_or(5).max(1);
		SearchResponse { results: self.random_results(result_type, count), error: None }
	}
}

#[cfg(test)]
mod tests {
	use librarian::protocol::{Params, TransformKind};

	use super::*;

	fn transform_req(kind: TransformKind, from: Option<ResourceType>, to: Option<ResourceType>) -> TransformRequest {
		TransformRequest { kind, id: AccessIdentifier::new("i", "K1"), from_type: from, to_type: to, params: Params::default() }
	}

	#[tokio::test]
	async fn search_with_unsupported_type_reports_error() {
		let mut store = RandomDataStore::new();
		store.supported_types = [ResourceType::Page].into_iter().collect();
		let req = SearchRequest::new("q", [ResourceType::Audio].into_iter().collect());
		let resp = store.run_search(&req).await;
		assert!(resp.is_error());
		assert!(resp.results.is_empty());
	}

	#[tokio::test]
	async fn search_with_supported_type_returns_results() {
		let store = RandomDataStore::new();
		let req = SearchRequest::new("q", [ResourceType::Page].into_iter().collect());
		let resp = store.run_search(&req).await;
		assert!(!resp.is_error());
		assert!(!resp.results.is_empty());
	}

	#[tokio::test]
	async fn unknown_dynamic_transform_name_is_empty_without_error() {
		let store = RandomDataStore::new();
		let dt_id = DynamicTransformId::new("somethingElse", ResourceType::Page);
		let req = transform_req(TransformKind::Dynamic(dt_id.clone()), Some(ResourceType::Page), None);
		let resp = store.run_dynamic(&dt_id, &req).await;
		assert!(!resp.is_error());
		assert!(resp.results.is_empty());
	}

	#[tokio::test]
	async fn known_dynamic_transform_produces_random_results() {
		let store = RandomDataStore::new();
		let dt_id = DynamicTransformId::new(RELATED_RANDOM, ResourceType::Page);
		let req = transform_req(TransformKind::Dynamic(dt_id.clone()), Some(ResourceType::Page), None);
		let resp = store.run_dynamic(&dt_id, &req).await;
		assert!(!resp.is_error());
		assert!(!resp.results.is_empty());
	}

	#[tokio::test]
	async fn lookup_stamps_requested_kind_onto_the_record() {
		let store = RandomDataStore::new();
		let id = AccessIdentifier::new("i", "K1");
		let resp = store.lookup(ResourceType::Video, &id).await;
		assert!(resp.record.is_some());
		assert_eq!(resp.record.unwrap().resource_type, ResourceType::Video);
	}
}
