//! Core library for the Librarian federated search-and-lookup broker.
//!
//! Four pieces compose the broker, leaves-first: the [`types`] resource
//! model, the [`registry`] of connected endpoints, the [`router`] that
//! picks targets for a request, and the [`dispatcher`] that fans a
//! request out and merges the replies. [`endpoint`] is the mirror image
//! that runs inside each backend process, and [`transport`] is the thin
//! RPC layer connecting the two.

pub mod dispatcher;
pub mod endpoint;
pub mod protocol;
pub mod registry;
pub mod router;
pub mod transport;
pub mod types;

pub use dispatcher::Dispatcher;
pub use protocol::{Request, Response};
pub use registry::{Registry, RegistryError};
pub use router::route;
pub use types::{AccessIdentifier, ContainmentRelation, DynamicTransformId, InvalidTypeString, ResourceType};
