//! The capability interface an endpoint implementation satisfies
//! (spec §4.5). Everything here is pure backend logic — search
//! algorithms, ranking, persistence — which is explicitly out of
//! scope for the core (spec §1); this trait is only the seam.

use async_trait::async_trait;

use crate::protocol::{LookupResponse, SearchRequest, SearchResponse, TransformRequest};
use crate::types::{AccessIdentifier, DynamicTransformId, ResourceType};

/// What a backend data store must expose to serve requests
/// (spec §4.5).
///
/// Non-support contract, identical for every `run_*` method: an
/// unsupported *type* answers with empty `results` and `error` set; a
/// supported type but unsupported *operation* answers with empty
/// `results` and no `error`.
#[async_trait]
pub trait DataStore: Send + Sync {
	async fn run_search(&self, req: &SearchRequest) -> SearchResponse;
	async fn run_container_transform(&self, req: &TransformRequest) -> SearchResponse;
	async fn run_contents_transform(&self, req: &TransformRequest) -> SearchResponse;
	async fn run_overlaps(&self, req: &TransformRequest) -> SearchResponse;
	async fn run_occur_as_obj(&self, req: &TransformRequest) -> SearchResponse;
	async fn run_occur_as_subj(&self, req: &TransformRequest) -> SearchResponse;
	async fn run_occur_has_obj(&self, req: &TransformRequest) -> SearchResponse;
	async fn run_occur_has_subj(&self, req: &TransformRequest) -> SearchResponse;
	async fn run_nearby_locations(&self, req: &TransformRequest) -> SearchResponse;
	async fn run_dynamic(&self, dt_id: &DynamicTransformId, req: &TransformRequest) -> SearchResponse;
	async fn lookup(&self, kind: ResourceType, id: &AccessIdentifier) -> LookupResponse;
}
