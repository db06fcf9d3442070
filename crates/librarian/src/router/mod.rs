//! Pure routing: given one request and a registry snapshot, decide
//! which endpoint keys should receive it (spec §4.3). Never touches
//! the network and never mutates anything — same snapshot, same
//! request, same answer, always.

use crate::protocol::{Request, TransformKind, TransformRequest};
use crate::registry::{RegistryError, RegistrySnapshot};
use crate::types::ResourceType;

/// Select target endpoint keys for `request` against `snapshot` (spec
/// §4.3's routing table). `UnknownResource` propagates from
/// `groupIdOf` for any non-search request scoped to an unregistered
/// access identifier.
pub fn route(request: &Request, snapshot: &RegistrySnapshot) -> Result<Vec<String>, RegistryError> {
	match request {
		Request::Search(search) => Ok(snapshot.keys_supporting(&search.types)),

		// Lookup always targets exactly the claimed owner, known or not —
		// the Dispatcher is what turns an unknown key into a typed stub
		// (spec §4.4), so routing never fails here.
		Request::Lookup(lookup) => Ok(vec![lookup.id.resource_id.clone()]),

		Request::Transform(transform) => {
			let group_id = group_id_of(snapshot, transform)?;
			Ok(match &transform.kind {
				TransformKind::Dynamic(dt_id) => snapshot.group_members_supporting_dynamic(dt_id, &group_id),
				TransformKind::NearbyLocations => snapshot.group_members_supporting(ResourceType::Location, &group_id),
				TransformKind::Contents => match transform.to_type {
					Some(to) => snapshot.group_members_supporting(to, &group_id),
					None => Vec::new(),
				},
				TransformKind::Container
				| TransformKind::Overlaps
				| TransformKind::OccurAsObj
				| TransformKind::OccurAsSubj
				| TransformKind::OccurHasObj
				| TransformKind::OccurHasSubj => match transform.from_type {
					Some(from) => snapshot.group_members_supporting(from, &group_id),
					None => Vec::new(),
				},
			})
		},
	}
}

fn group_id_of(snapshot: &RegistrySnapshot, transform: &TransformRequest) -> Result<String, RegistryError> {
	snapshot
		.endpoint(&transform.id.resource_id)
		.map(|r| r.group_id.clone())
		.ok_or_else(|| RegistryError::UnknownResource(transform.id.resource_id.clone()))
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use super::*;
	use crate::protocol::{LookupRequest, SearchRequest};
	use crate::registry::EndpointRecord;
	use crate::transport::channel::ChannelTransport;
	use crate::types::AccessIdentifier;

	fn record(key: &str, group_id: &str, types: &[ResourceType]) -> EndpointRecord {
		let (handle, _rx) = ChannelTransport::new_pair();
		EndpointRecord {
			key: key.to_string(),
			group_id: group_id.to_string(),
			hostname: "h".to_string(),
			port: 1,
			supported_types: types.iter().copied().collect(),
			dynamic_transforms: Vec::new(),
			handle: Arc::new(handle),
		}
	}

	#[test]
	fn search_routes_to_every_group_supporting_the_type() {
		let snap = RegistrySnapshot::default()
			.with_endpoint(record("K1", "g", &[ResourceType::Page]))
			.with_endpoint(record("K2", "h", &[ResourceType::Page]))
			.with_endpoint(record("K3", "h", &[ResourceType::Audio]));
		let req = Request::Search(SearchRequest::new("q", [ResourceType::Page].into_iter().collect()));
		let mut targets = route(&req, &snap).unwrap();
		targets.sort();
		assert_eq!(targets, vec!["K1".to_string(), "K2".to_string()]);
	}

	#[test]
	fn search_with_unsupported_type_routes_to_nothing() {
		let snap = RegistrySnapshot::default().with_endpoint(record("K1", "g", &[ResourceType::Page]));
		let req = Request::Search(SearchRequest::new("q", [ResourceType::Audio].into_iter().collect()));
		assert!(route(&req, &snap).unwrap().is_empty());
	}

	#[test]
	fn lookup_routes_to_the_claimed_owner_even_if_unregistered() {
		let snap = RegistrySnapshot::default();
		let req = Request::Lookup(LookupRequest::new(ResourceType::Page, AccessIdentifier::new("i", "ZZZZ")));
		assert_eq!(route(&req, &snap).unwrap(), vec!["ZZZZ".to_string()]);
	}

	#[test]
	fn transform_is_scoped_to_the_owning_group_only() {
		let snap = RegistrySnapshot::default()
			.with_endpoint(record("K1", "g", &[ResourceType::Person]))
			.with_endpoint(record("K2", "h", &[ResourceType::Person]));
		let id = AccessIdentifier::new("i", "K1");
		let req = Request::Transform(TransformRequest::new(TransformKind::OccurAsObj, id).with_from_type(ResourceType::Person));
		assert_eq!(route(&req, &snap).unwrap(), vec!["K1".to_string()]);
	}

	#[test]
	fn transform_on_unregistered_id_fails_with_unknown_resource() {
		let snap = RegistrySnapshot::default();
		let id = AccessIdentifier::new("i", "ZZZZ");
		let req = Request::Transform(TransformRequest::new(TransformKind::Container, id).with_from_type(ResourceType::Page));
		assert_eq!(route(&req, &snap), Err(RegistryError::UnknownResource("ZZZZ".to_string())));
	}

	#[test]
	fn nearby_locations_always_targets_location_supporters() {
		let snap = RegistrySnapshot::default()
			.with_endpoint(record("K1", "g", &[ResourceType::Location]))
			.with_endpoint(record("K2", "g", &[ResourceType::Page]));
		let id = AccessIdentifier::new("i", "K2");
		let req = Request::Transform(TransformRequest::new(TransformKind::NearbyLocations, id));
		assert_eq!(route(&req, &snap).unwrap(), vec!["K1".to_string()]);
	}
}
