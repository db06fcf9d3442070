//! The closed resource-type model and the containment relation that
//! constrains which transforms are valid between which types.

mod ids;
mod resource;

pub use ids::{AccessIdentifier, DynamicTransformId};
pub use resource::{ContainmentRelation, InvalidTypeString, ResourceType};
