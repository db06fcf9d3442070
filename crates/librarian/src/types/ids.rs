use serde::{Deserialize, Serialize};

use super::resource::ResourceType;

/// Identifies an endpoint-defined "dynamic transform". The same `name`
/// may be overloaded across different `from_type`s, so both fields
/// participate in equality (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicTransformId {
	pub name: String,
	pub from_type: ResourceType,
}

impl DynamicTransformId {
	pub fn new(name: impl Into<String>, from_type: ResourceType) -> Self {
		Self { name: name.into(), from_type }
	}
}

/// Locates a single object within one endpoint: `identifier` is opaque
/// to the broker and meaningful only to the endpoint named by
/// `resource_id`. `error` is populated only on lookup-failure stubs
/// (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessIdentifier {
	pub identifier: String,
	pub resource_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

impl AccessIdentifier {
	pub fn new(identifier: impl Into<String>, resource_id: impl Into<String>) -> Self {
		Self {
			identifier: identifier.into(),
			resource_id: resource_id.into(),
			error: None,
		}
	}

	/// Build a failure stub that carries an error but no valid payload,
	/// preserving the caller's identifier/resource_id for round-trip
	/// debugging (spec §4.4, §4.5 stub rules).
	pub fn error_stub(identifier: impl Into<String>, resource_id: impl Into<String>, error: impl Into<String>) -> Self {
		Self {
			identifier: identifier.into(),
			resource_id: resource_id.into(),
			error: Some(error.into()),
		}
	}

	pub fn is_error(&self) -> bool {
		self.error.is_some()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::ResourceType;

	#[test]
	fn dynamic_transform_ids_with_different_from_type_are_distinct() {
		let a = DynamicTransformId::new("nearby", ResourceType::Location);
		let b = DynamicTransformId::new("nearby", ResourceType::Page);
		assert_ne!(a, b);
	}

	#[test]
	fn dynamic_transform_ids_with_same_fields_are_equal() {
		let a = DynamicTransformId::new("nearby", ResourceType::Location);
		let b = DynamicTransformId::new("nearby", ResourceType::Location);
		assert_eq!(a, b);
	}

	#[test]
	fn error_stub_carries_error() {
		let id = AccessIdentifier::error_stub("i", "K1", "boom");
		assert!(id.is_error());
		assert_eq!(id.error.as_deref(), Some("boom"));
	}
}
