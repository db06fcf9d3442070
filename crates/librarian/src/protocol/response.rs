use serde::{Deserialize, Serialize};

use super::record::ResourceRecord;
use crate::types::AccessIdentifier;

/// One hit in a `SearchResponse` (spec §3). Transforms are modeled as
/// producing the same result shape as search — a list of access
/// identifiers plus payload — since the spec gives transforms no
/// separate response schema beyond "results" and "error".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
	pub id: AccessIdentifier,
	#[serde(flatten)]
	pub record: ResourceRecord,
}

/// `SearchResponse(results, error?)` (spec §3). Also the response shape
/// for all nine transforms and for the Dispatcher's own synthetic
/// replies (`RouteEmpty`, total-failure) described in spec §4.4/§7.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
	pub results: Vec<SearchResult>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

impl SearchResponse {
	pub fn empty() -> Self {
		Self::default()
	}

	pub fn with_error(error: impl Into<String>) -> Self {
		Self { results: Vec::new(), error: Some(error.into()) }
	}

	pub fn is_error(&self) -> bool {
		self.error.is_some()
	}
}

/// Response to one of the eight typed lookups. `record` is absent when
/// `id.error` is set (unrecognized/mismatched resource id stub, spec
/// §4.4/§4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResponse {
	pub id: AccessIdentifier,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub record: Option<ResourceRecord>,
}

impl LookupResponse {
	pub fn found(record: ResourceRecord) -> Self {
		Self { id: record.id.clone(), record: Some(record) }
	}

	pub fn stub(id: AccessIdentifier) -> Self {
		Self { id, record: None }
	}
}

/// Every response kind the broker returns to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Response {
	Search(SearchResponse),
	Lookup(LookupResponse),
}

impl Response {
	pub fn unwrap_search(self) -> SearchResponse {
		match self {
			Response::Search(s) => s,
			Response::Lookup(_) => panic!("expected a Search response, got a Lookup response"),
		}
	}

	pub fn unwrap_lookup(self) -> LookupResponse {
		match self {
			Response::Lookup(l) => l,
			Response::Search(_) => panic!("expected a Lookup response, got a Search response"),
		}
	}
}
