//! Tracks connected endpoints, their capabilities, group membership,
//! and key allocation (spec §4.2).

mod error;
mod key;
mod snapshot;

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::info;

pub use error::RegistryError;
pub use key::{generate_group_id, generate_key};
pub use snapshot::{EndpointRecord, RegistrySnapshot};

use crate::protocol::{ConnectRequest, LibraryConnected};
use crate::transport::EndpointHandle;
use crate::types::AccessIdentifier;

/// The broker's view of connected endpoints. Mutations (`connect`,
/// `disconnect`) go through a single writer lock that serializes the
/// read-modify-swap sequence; reads (`snapshot`) never block on that
/// lock, matching the single-writer/many-reader discipline spec §5
/// requires.
#[derive(Debug)]
pub struct Registry {
	current: ArcSwap<RegistrySnapshot>,
	write_lock: Mutex<()>,
}

impl Default for Registry {
	fn default() -> Self {
		Self::new()
	}
}

impl Registry {
	pub fn new() -> Self {
		Self {
			current: ArcSwap::new(Arc::new(RegistrySnapshot::default())),
			write_lock: Mutex::new(()),
		}
	}

	/// An immutable, consistent view of the registry for the Router and
	/// Dispatcher to read from (spec §5: "Readers see a consistent
	/// snapshot per request").
	pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
		self.current.load_full()
	}

	/// Register (or idempotently reconnect) an endpoint (spec §4.2).
	///
	/// Key allocation: an absent `requested_key` gets a freshly
	/// generated one; a present-and-unused one is granted as-is; a
	/// present-and-used one is granted again, unchanged, only if the
	/// existing record's `(hostname, port, group_id)` is compatible with
	/// this request (a `None` `group_id` on the request is treated as
	/// "don't care", matching whatever group the key was already in) —
	/// otherwise the connect is refused and no state changes (see
	/// `DESIGN.md` for why we resolve the spec's comparison this way).
	///
	/// Group allocation: an absent `group_id` mints a fresh one owned
	/// solely by this endpoint; a present group id is joined if known,
	/// created if not.
	pub fn connect(&self, req: ConnectRequest, handle: Arc<dyn EndpointHandle>) -> LibraryConnected {
		let _write_guard = self.write_lock.lock();
		let current = self.current.load();

		if let Some(requested) = req.requested_key.clone()
			&& let Some(existing) = current.endpoint(&requested)
		{
			let group_matches = req.group_id.as_deref().is_none_or(|g| g == existing.group_id);
			if existing.hostname != req.hostname || existing.port != req.port || !group_matches {
				let err = RegistryError::KeyCollision { key: requested.clone() };
				info!(target: "registry", key = %requested, "refusing incompatible reconnect");
				return LibraryConnected::refused(err.to_string());
			}

			let group_id = existing.group_id.clone();
			let record = EndpointRecord {
				key: requested.clone(),
				group_id: group_id.clone(),
				hostname: req.hostname,
				port: req.port,
				supported_types: req.supported_types,
				dynamic_transforms: req.dynamic_transforms,
				handle,
			};
			self.current.store(Arc::new(current.with_endpoint(record)));
			info!(target: "registry", key = %requested, "endpoint reconnected");
			return LibraryConnected::accepted(requested, group_id);
		}

		let key = match req.requested_key {
			Some(k) => k,
			None => loop {
				let candidate = generate_key();
				if !current.contains_key(&candidate) {
					break candidate;
				}
			},
		};
		let group_id = req.group_id.unwrap_or_else(generate_group_id);

		let record = EndpointRecord {
			key: key.clone(),
			group_id: group_id.clone(),
			hostname: req.hostname,
			port: req.port,
			supported_types: req.supported_types,
			dynamic_transforms: req.dynamic_transforms,
			handle,
		};
		self.current.store(Arc::new(current.with_endpoint(record)));
		info!(target: "registry", key = %key, group_id = %group_id, "endpoint connected");
		LibraryConnected::accepted(key, group_id)
	}

	/// Remove an endpoint, shrinking the union sets if it was the last
	/// supporter of something (the deregistration path `SPEC_FULL.md`
	/// §4.2 adds on top of the distilled spec, which never removes
	/// endpoints).
	pub fn disconnect(&self, key: &str) {
		let _write_guard = self.write_lock.lock();
		let current = self.current.load();
		if !current.contains_key(key) {
			return;
		}
		self.current.store(Arc::new(current.without_endpoint(key)));
		info!(target: "registry", key, "endpoint disconnected");
	}

	/// The group an access identifier's owning endpoint belongs to
	/// (spec §4.2, `groupIdOf`). `UnknownResource` when the key isn't
	/// registered.
	pub fn group_id_of(&self, id: &AccessIdentifier) -> Result<String, RegistryError> {
		self
			.current
			.load()
			.endpoint(&id.resource_id)
			.map(|r| r.group_id.clone())
			.ok_or_else(|| RegistryError::UnknownResource(id.resource_id.clone()))
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;
	use std::sync::Arc;

	use super::*;
	use crate::transport::channel::ChannelTransport;
	use crate::types::ResourceType;

	fn connect_req(hostname: &str, port: u16, types: &[ResourceType]) -> ConnectRequest {
		ConnectRequest::new(hostname, port, types.iter().copied().collect())
	}

	fn handle() -> Arc<dyn EndpointHandle> {
		let (h, _rx) = ChannelTransport::new_pair();
		Arc::new(h)
	}

	#[test]
	fn connect_without_requested_key_gets_fresh_key() {
		let registry = Registry::new();
		let ack = registry.connect(connect_req("h1", 9000, &[ResourceType::Page]), handle());
		assert!(ack.is_accepted());
		assert_eq!(ack.key.len(), key::KEY_LEN);
	}

	#[test]
	fn connected_endpoint_is_in_keys_supporting_its_types() {
		let registry = Registry::new();
		let ack = registry.connect(connect_req("h1", 9000, &[ResourceType::Page]), handle());
		let types: HashSet<_> = [ResourceType::Page].into_iter().collect();
		assert!(registry.snapshot().keys_supporting(&types).contains(&ack.key));
	}

	#[test]
	fn connect_without_group_id_mints_solo_group() {
		let registry = Registry::new();
		let ack = registry.connect(connect_req("h1", 9000, &[ResourceType::Page]), handle());
		assert!(!ack.group_id.is_empty());
		assert_eq!(registry.snapshot().group(&ack.group_id).unwrap().len(), 1);
	}

	#[test]
	fn two_endpoints_same_group_id_join_same_group() {
		let registry = Registry::new();
		let req_a = connect_req("h1", 9000, &[ResourceType::Page]).with_group_id("g");
		let req_b = connect_req("h2", 9001, &[ResourceType::Page]).with_group_id("g");
		let a = registry.connect(req_a, handle());
		let b = registry.connect(req_b, handle());
		assert_eq!(a.group_id, "g");
		assert_eq!(b.group_id, "g");
		assert_eq!(registry.snapshot().group("g").unwrap().len(), 2);
	}

	#[test]
	fn reconnect_with_same_requested_key_and_address_is_idempotent() {
		let registry = Registry::new();
		let req = connect_req("h1", 9000, &[ResourceType::Page]).with_requested_key("abc").with_group_id("g1");
		let first = registry.connect(req.clone(), handle());
		let second = registry.connect(req, handle());
		assert!(first.is_accepted());
		assert!(second.is_accepted());
		assert_eq!(first.key, second.key);
		assert_eq!(registry.snapshot().endpoint_count(), 1);
	}

	#[test]
	fn requested_key_reuse_with_different_address_is_refused() {
		let registry = Registry::new();
		let req_a = connect_req("h1", 9000, &[ResourceType::Page]).with_requested_key("abc").with_group_id("g1");
		let req_b = connect_req("h2", 9001, &[ResourceType::Page]).with_requested_key("abc").with_group_id("g1");
		let a = registry.connect(req_a, handle());
		let b = registry.connect(req_b, handle());
		assert!(a.is_accepted());
		assert!(!b.is_accepted());
		assert_eq!(registry.snapshot().endpoint_count(), 1);
	}

	#[test]
	fn group_id_of_fails_for_unknown_resource() {
		let registry = Registry::new();
		let id = AccessIdentifier::new("i", "ZZZZ");
		assert_eq!(registry.group_id_of(&id), Err(RegistryError::UnknownResource("ZZZZ".to_string())));
	}

	#[test]
	fn disconnect_removes_endpoint_and_shrinks_union() {
		let registry = Registry::new();
		let ack = registry.connect(connect_req("h1", 9000, &[ResourceType::Audio]), handle());
		registry.disconnect(&ack.key);
		assert_eq!(registry.snapshot().endpoint_count(), 0);
		assert!(!registry.snapshot().union_supported_types().contains(&ResourceType::Audio));
	}
}
