use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::{AccessIdentifier, DynamicTransformId, ResourceType};

/// Paging/locale parameters shared by every transform (spec §3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Params {
	#[serde(default)]
	pub num_requested: Option<u32>,
	#[serde(default)]
	pub start_at: Option<u32>,
	#[serde(default)]
	pub language: Option<String>,
}

/// `Search(query, params, types)` (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
	pub query: String,
	#[serde(default)]
	pub params: Params,
	pub types: HashSet<ResourceType>,
}

impl SearchRequest {
	pub fn new(query: impl Into<String>, types: HashSet<ResourceType>) -> Self {
		Self { query: query.into(), params: Params::default(), types }
	}
}

/// Which of the nine transform operations is being requested. Only
/// `DynamicTransform` carries a payload; the rest are distinguished by
/// tag alone, with `from_type`/`to_type` on [`TransformRequest`]
/// supplying the type context the router needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransformKind {
	Container,
	Contents,
	Overlaps,
	OccurAsObj,
	OccurAsSubj,
	OccurHasObj,
	OccurHasSubj,
	NearbyLocations,
	Dynamic(DynamicTransformId),
}

/// One of the nine transform requests: `ContainerTransform`,
/// `ContentsTransform`, `OverlapsTransform`, `OccurAsObj`,
/// `OccurAsSubj`, `OccurHasObj`, `OccurHasSubj`, `NearbyLocations`,
/// `DynamicTransform` (spec §3). All carry at least `(id, fromType?,
/// toType?, params)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformRequest {
	pub kind: TransformKind,
	pub id: AccessIdentifier,
	#[serde(default)]
	pub from_type: Option<ResourceType>,
	#[serde(default)]
	pub to_type: Option<ResourceType>,
	#[serde(default)]
	pub params: Params,
}

impl TransformRequest {
	pub fn new(kind: TransformKind, id: AccessIdentifier) -> Self {
		Self { kind, id, from_type: None, to_type: None, params: Params::default() }
	}

	pub fn with_from_type(mut self, t: ResourceType) -> Self {
		self.from_type = Some(t);
		self
	}

	pub fn with_to_type(mut self, t: ResourceType) -> Self {
		self.to_type = Some(t);
		self
	}
}

/// One of the eight typed lookups (`LookupCollection`, `LookupPage`,
/// …), keyed by [`ResourceType`] rather than nine separate structs
/// since the only variation between them is the kind tag (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupRequest {
	pub kind: ResourceType,
	pub id: AccessIdentifier,
}

impl LookupRequest {
	pub fn new(kind: ResourceType, id: AccessIdentifier) -> Self {
		Self { kind, id }
	}
}

/// Every request kind the broker accepts from a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Request {
	Search(SearchRequest),
	Transform(TransformRequest),
	Lookup(LookupRequest),
}

impl Request {
	/// The `AccessIdentifier` a non-search request is scoped to. `None`
	/// for `Search`, which is unscoped (spec §4.3).
	pub fn scoped_id(&self) -> Option<&AccessIdentifier> {
		match self {
			Request::Search(_) => None,
			Request::Transform(t) => Some(&t.id),
			Request::Lookup(l) => Some(&l.id),
		}
	}
}
