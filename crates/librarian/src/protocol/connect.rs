use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::{DynamicTransformId, ResourceType};

/// Sent once by an endpoint on startup (spec §3, §4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest {
	pub hostname: String,
	pub port: u16,
	#[serde(default)]
	pub group_id: Option<String>,
	#[serde(default)]
	pub requested_key: Option<String>,
	pub supported_types: HashSet<ResourceType>,
	#[serde(default)]
	pub dynamic_transforms: Vec<DynamicTransformId>,
}

impl ConnectRequest {
	pub fn new(hostname: impl Into<String>, port: u16, supported_types: HashSet<ResourceType>) -> Self {
		Self {
			hostname: hostname.into(),
			port,
			group_id: None,
			requested_key: None,
			supported_types,
			dynamic_transforms: Vec::new(),
		}
	}

	pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
		self.group_id = Some(group_id.into());
		self
	}

	pub fn with_requested_key(mut self, key: impl Into<String>) -> Self {
		self.requested_key = Some(key.into());
		self
	}

	pub fn with_dynamic_transforms(mut self, transforms: Vec<DynamicTransformId>) -> Self {
		self.dynamic_transforms = transforms;
		self
	}
}

/// The broker's reply to a [`ConnectRequest`]. On success, `key` is the
/// assigned (possibly idempotently re-granted) key and `error` is
/// `None`. On `KeyCollision` refusal, `key` is empty and `error` is set
/// (spec §7, rule 5) — the endpoint stays `Disconnected` and does not
/// handle requests (spec §4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryConnected {
	#[serde(default)]
	pub key: String,
	#[serde(default)]
	pub group_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

impl LibraryConnected {
	pub fn accepted(key: impl Into<String>, group_id: impl Into<String>) -> Self {
		Self { key: key.into(), group_id: group_id.into(), error: None }
	}

	pub fn refused(error: impl Into<String>) -> Self {
		Self { key: String::new(), group_id: String::new(), error: Some(error.into()) }
	}

	pub fn is_accepted(&self) -> bool {
		self.error.is_none()
	}
}
