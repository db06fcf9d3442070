use std::collections::HashSet;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;

use crate::transport::EndpointHandle;
use crate::types::{DynamicTransformId, ResourceType};

/// Broker-side record of one connected endpoint (spec §3). `handle` is
/// the opaque "liveHandle" the spec describes: a reference usable to
/// send the endpoint messages, without the registry needing to know
/// how those messages actually travel (see [`crate::transport`]).
#[derive(Clone)]
pub struct EndpointRecord {
	pub key: String,
	pub group_id: String,
	pub hostname: String,
	pub port: u16,
	pub supported_types: HashSet<ResourceType>,
	pub dynamic_transforms: Vec<DynamicTransformId>,
	pub handle: Arc<dyn EndpointHandle>,
}

impl std::fmt::Debug for EndpointRecord {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EndpointRecord")
			.field("key", &self.key)
			.field("group_id", &self.group_id)
			.field("hostname", &self.hostname)
			.field("port", &self.port)
			.field("supported_types", &self.supported_types)
			.field("dynamic_transforms", &self.dynamic_transforms)
			.finish_non_exhaustive()
	}
}

/// An immutable view of the whole registry (spec §3, `BrokerState`).
/// Rebuilt copy-on-write on every successful `connect`/`disconnect` and
/// swapped in atomically by [`super::Registry`], mirroring the
/// teacher's `ArcSwap<Option<Arc<CompiledRegistry>>>` hot-reload
/// pattern: readers (Router, Dispatcher) always see one consistent
/// snapshot for the lifetime of a single request, with no locking on
/// the read path.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
	endpoints: IndexMap<String, Arc<EndpointRecord>>,
	groups: IndexMap<String, IndexSet<String>>,
	union_supported_types: HashSet<ResourceType>,
	union_dynamic_transforms: HashSet<DynamicTransformId>,
}

impl RegistrySnapshot {
	pub fn endpoint(&self, key: &str) -> Option<&Arc<EndpointRecord>> {
		self.endpoints.get(key)
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.endpoints.contains_key(key)
	}

	pub fn group(&self, group_id: &str) -> Option<&IndexSet<String>> {
		self.groups.get(group_id)
	}

	pub fn union_supported_types(&self) -> &HashSet<ResourceType> {
		&self.union_supported_types
	}

	pub fn union_dynamic_transforms(&self) -> &HashSet<DynamicTransformId> {
		&self.union_dynamic_transforms
	}

	pub fn endpoint_count(&self) -> usize {
		self.endpoints.len()
	}

	/// Keys whose `supported_types` intersects `types` (spec §4.2,
	/// `keysSupporting`), across every group.
	pub fn keys_supporting(&self, types: &HashSet<ResourceType>) -> Vec<String> {
		self
			.endpoints
			.values()
			.filter(|r| r.supported_types.iter().any(|t| types.contains(t)))
			.map(|r| r.key.clone())
			.collect_vec()
	}

	/// Subset of `groups[group_id]` whose records support `t` (spec
	/// §4.2, `groupMembersSupporting`).
	pub fn group_members_supporting(&self, t: ResourceType, group_id: &str) -> Vec<String> {
		let Some(members) = self.groups.get(group_id) else {
			return Vec::new();
		};
		members
			.iter()
			.filter(|key| self.endpoints.get(*key).is_some_and(|r| r.supported_types.contains(&t)))
			.cloned()
			.collect_vec()
	}

	/// Subset matching `dt_id` exactly (name AND `from_type`), spec
	/// §4.2 `groupMembersSupportingDynamic`.
	pub fn group_members_supporting_dynamic(&self, dt_id: &DynamicTransformId, group_id: &str) -> Vec<String> {
		let Some(members) = self.groups.get(group_id) else {
			return Vec::new();
		};
		members
			.iter()
			.filter(|key| self.endpoints.get(*key).is_some_and(|r| r.dynamic_transforms.contains(dt_id)))
			.cloned()
			.collect_vec()
	}

	/// Rebuild a new snapshot with `record` inserted/overwritten. The
	/// union sets are recomputed from the resulting endpoint map rather
	/// than merely extended: a requested-key reconnect (spec §4.2) can
	/// legitimately replace a record with one that supports *fewer*
	/// types or transforms than before, and a plain `.extend()` would
	/// leave the old, now-stale entries in the union forever, breaking
	/// the spec §3 invariant `unionSupportedTypes = ⋃ r.supportedTypes`.
	/// Used by [`super::Registry::connect`] to produce the copy-on-write
	/// successor snapshot.
	pub(crate) fn with_endpoint(&self, record: EndpointRecord) -> Self {
		let mut next = self.clone();
		let key = record.key.clone();
		let group_id = record.group_id.clone();
		next.groups.entry(group_id).or_default().insert(key.clone());
		next.endpoints.insert(key, Arc::new(record));
		next.union_supported_types = next.endpoints.values().flat_map(|r| r.supported_types.iter().copied()).collect();
		next.union_dynamic_transforms = next.endpoints.values().flat_map(|r| r.dynamic_transforms.iter().cloned()).collect();
		next
	}

	/// Rebuild a new snapshot with `key` removed from its group and from
	/// `endpoints`, shrinking the union sets when `key` was the last
	/// supporter of a type/transform (the deregistration path added in
	/// `SPEC_FULL.md` §4.2).
	pub(crate) fn without_endpoint(&self, key: &str) -> Self {
		let mut next = self.clone();
		let Some(removed) = next.endpoints.shift_remove(key) else {
			return next;
		};
		if let Some(members) = next.groups.get_mut(&removed.group_id) {
			members.shift_remove(key);
			if members.is_empty() {
				next.groups.shift_remove(&removed.group_id);
			}
		}
		next.union_supported_types = next.endpoints.values().flat_map(|r| r.supported_types.iter().copied()).collect();
		next.union_dynamic_transforms = next.endpoints.values().flat_map(|r| r.dynamic_transforms.iter().cloned()).collect();
		next
	}
}
