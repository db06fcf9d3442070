use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// The closed enumeration of resource kinds the library serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceType {
	Collection,
	Page,
	Picture,
	Video,
	Audio,
	Person,
	Location,
	Organization,
}

impl ResourceType {
	/// All eight variants, in declaration order.
	pub const ALL: [ResourceType; 8] = [
		ResourceType::Collection,
		ResourceType::Page,
		ResourceType::Picture,
		ResourceType::Video,
		ResourceType::Audio,
		ResourceType::Person,
		ResourceType::Location,
		ResourceType::Organization,
	];

	fn as_str(&self) -> &'static str {
		match self {
			ResourceType::Collection => "Collection",
			ResourceType::Page => "Page",
			ResourceType::Picture => "Picture",
			ResourceType::Video => "Video",
			ResourceType::Audio => "Audio",
			ResourceType::Person => "Person",
			ResourceType::Location => "Location",
			ResourceType::Organization => "Organization",
		}
	}
}

impl fmt::Display for ResourceType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Error returned by [`ResourceType::from_str`] for an unrecognized type
/// name. This is a client-side programmer error (spec §7,
/// `InvalidTypeString`): it is never sent over the wire, only surfaced
/// at the call site that tried to parse a type name.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unrecognized resource type: '{0}'")]
pub struct InvalidTypeString(pub String);

impl FromStr for ResourceType {
	type Err = InvalidTypeString;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		ResourceType::ALL
			.into_iter()
			.find(|t| t.as_str().eq_ignore_ascii_case(s))
			.ok_or_else(|| InvalidTypeString(s.to_string()))
	}
}

/// The fixed `contains` / `containedBy` maps, and the predicates built
/// on top of them. Both maps are immutable process-wide data: there is
/// no mutation path, by design (spec §4.1).
pub struct ContainmentRelation;

type TypeMap = HashMap<ResourceType, Vec<ResourceType>>;

static CONTAINS: LazyLock<TypeMap> = LazyLock::new(|| {
	use ResourceType::*;
	let mut m: TypeMap = HashMap::new();
	m.insert(Collection, vec![Page]);
	m.insert(Page, vec![Picture, Video, Audio, Person, Location, Organization]);
	m.insert(Picture, vec![Person, Location, Organization]);
	m.insert(Video, vec![Person, Location, Organization]);
	m.insert(Audio, vec![Person, Location, Organization]);
	m
});

static CONTAINED_BY: LazyLock<TypeMap> = LazyLock::new(|| {
	// Derived as the exact inverse of CONTAINS, plus nothing else: the
	// invariant in spec §3 requires `t2 in contains[t1] iff t1 in
	// containedBy[t2]` for every ordered pair, so we build it by
	// inversion rather than hand-duplicating the table.
	let mut m: TypeMap = HashMap::new();
	for (&container, contained) in CONTAINS.iter() {
		for &c in contained {
			m.entry(c).or_default().push(container);
		}
	}
	m
});

impl ContainmentRelation {
	/// `true` iff `t2` is a valid immediate member of `t1`.
	pub fn contains(t1: ResourceType, t2: ResourceType) -> bool {
		CONTAINS.get(&t1).is_some_and(|v| v.contains(&t2))
	}

	/// The types that may contain `t`, possibly empty (`Collection` has
	/// no container).
	pub fn containers_of(t: ResourceType) -> &'static [ResourceType] {
		CONTAINED_BY.get(&t).map(Vec::as_slice).unwrap_or(&[])
	}

	/// The types a given type may directly contain, possibly empty.
	pub fn contents_of(t: ResourceType) -> &'static [ResourceType] {
		CONTAINS.get(&t).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Used by client-side helpers to reject an ill-formed
	/// `ContentsTransform` request before it is ever sent.
	pub fn validate_contents(from: ResourceType, to: ResourceType) -> bool {
		Self::contains(from, to)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use ResourceType::*;

	#[test]
	fn containment_invariant_holds_for_every_pair() {
		for t1 in ResourceType::ALL {
			for t2 in ResourceType::ALL {
				assert_eq!(
					ContainmentRelation::contains(t1, t2),
					ContainmentRelation::containers_of(t2).contains(&t1),
					"invariant broken for ({t1}, {t2})"
				);
			}
		}
	}

	#[test]
	fn collection_contains_only_page() {
		assert!(ContainmentRelation::contains(Collection, Page));
		assert!(!ContainmentRelation::contains(Collection, Picture));
	}

	#[test]
	fn collection_has_no_container() {
		assert!(ContainmentRelation::containers_of(Collection).is_empty());
	}

	#[test]
	fn leaf_types_are_contained_by_every_media_page() {
		for leaf in [Person, Location, Organization] {
			let containers = ContainmentRelation::containers_of(leaf);
			for expected in [Page, Picture, Video, Audio] {
				assert!(containers.contains(&expected), "{leaf} should be contained by {expected}");
			}
		}
	}

	#[test]
	fn validate_contents_matches_contains() {
		assert!(ContainmentRelation::validate_contents(Page, Video));
		assert!(!ContainmentRelation::validate_contents(Video, Page));
	}

	#[test]
	fn parse_type_round_trips_display() {
		for t in ResourceType::ALL {
			assert_eq!(t.to_string().parse::<ResourceType>().unwrap(), t);
		}
	}

	#[test]
	fn parse_type_rejects_unknown_name() {
		assert!("Frobnicator".parse::<ResourceType>().is_err());
	}

	#[test]
	fn parse_type_is_case_insensitive() {
		assert_eq!("page".parse::<ResourceType>().unwrap(), Page);
	}
}
