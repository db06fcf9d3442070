use serde::{Deserialize, Serialize};

use crate::types::{AccessIdentifier, ResourceType};

/// The payload returned by a typed lookup. The concrete per-type schema
/// lives in the `DataStore` behind an endpoint (out of scope here, per
/// spec §1); this is the generic envelope the broker and endpoints
/// agree on so the core can be exercised without a real backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
	pub id: AccessIdentifier,
	pub resource_type: ResourceType,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	#[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
	pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl ResourceRecord {
	pub fn new(id: AccessIdentifier, resource_type: ResourceType) -> Self {
		Self { id, resource_type, title: None, attributes: serde_json::Map::new() }
	}

	pub fn with_title(mut self, title: impl Into<String>) -> Self {
		self.title = Some(title.into());
		self
	}
}
